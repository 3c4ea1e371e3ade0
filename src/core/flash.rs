//! One-shot messages carried to the next rendered page in a cookie.

use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse};

use crate::config::FLASH_COOKIE;
use crate::core::helpers::redirect_with_cookies;

pub fn flash_cookie(message: &str) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, urlencoding::encode(message).into_owned())
        .path("/")
        .http_only(true)
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub fn take_flash(req: &HttpRequest) -> Option<String> {
    let cookie = req.cookie(FLASH_COOKIE)?;
    let message = urlencoding::decode(cookie.value()).ok()?.into_owned();
    (!message.is_empty()).then_some(message)
}

/// Redirect and show `message` on whatever page renders next.
pub fn redirect_with_flash(location: &str, message: &str) -> HttpResponse {
    redirect_with_cookies(location, [flash_cookie(message)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn message_survives_cookie_encoding() {
        let cookie = flash_cookie("You cannot follow yourself.");
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(take_flash(&req).as_deref(), Some("You cannot follow yourself."));
    }

    #[test]
    fn missing_cookie_is_none() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(take_flash(&req), None);
    }

    #[test]
    fn redirect_carries_cookie() {
        let resp = redirect_with_flash("/", "hi there");
        let cookie = resp.cookies().find(|c| c.name() == FLASH_COOKIE).unwrap();
        assert_eq!(cookie.value(), "hi%20there");
    }
}
