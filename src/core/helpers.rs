use std::sync::OnceLock;

use actix_web::cookie::Cookie;
use actix_web::{http::header, HttpResponse};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use regex::Regex;

use crate::config::MAX_USERNAME_LENGTH;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn redirect(location: &str) -> HttpResponse {
    redirect_with_cookies(location, [])
}

pub fn redirect_with_cookies<I>(location: &str, cookies: I) -> HttpResponse
where
    I: IntoIterator<Item = Cookie<'static>>,
{
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    for cookie in cookies {
        builder.cookie(cookie);
    }
    builder.finish()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Regex should compile"))
}

/// Letters, digits and `@ . + - _`, at most 150 characters.
pub fn validate_username(username: &str) -> bool {
    username.chars().count() <= MAX_USERNAME_LENGTH && username_regex().is_match(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice"));
        assert!(validate_username("a.b@c+d-e_f"));
        assert!(!validate_username(""));
        assert!(!validate_username("has space"));
        assert!(!validate_username("<b>bob</b>"));
        assert!(!validate_username(&"x".repeat(151)));
    }

    #[test]
    fn redirect_sets_location() {
        let resp = redirect("/login");
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }
}
