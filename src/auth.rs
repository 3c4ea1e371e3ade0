use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SESSION_COOKIE;
use crate::core::errors::AppError;
use crate::core::helpers::{
    hash_password, now, redirect_with_cookies, validate_username, verify_password,
};
use crate::models::{session, user};
use crate::state::AppState;
use crate::templates::{form_message, page_response, render};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub async fn start_session(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Cookie<'static>, DbErr> {
    let token = Uuid::new_v4().to_string();

    session::ActiveModel {
        token: Set(token.clone()),
        user_id: Set(user.id),
        created_at: Set(now()),
    }
    .insert(db)
    .await?;

    Ok(session_cookie(token))
}

/// Delete every session older than `session_hours`. Returns how many
/// rows went away.
pub async fn purge_expired_sessions(
    db: &DatabaseConnection,
    session_hours: i64,
) -> Result<u64, DbErr> {
    let cutoff = now() - Duration::hours(session_hours);
    let result = session::Entity::delete_many()
        .filter(session::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        debug!("Purged {} expired sessions", result.rows_affected);
    }
    Ok(result.rows_affected)
}

/// The user behind the request's session cookie. Expired sessions are
/// deleted and treated as anonymous.
pub async fn current_user(
    req: &HttpRequest,
    state: &AppState,
) -> Result<Option<user::Model>, DbErr> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };

    let Some(session) = session::Entity::find_by_id(cookie.value().to_string())
        .one(&state.db)
        .await?
    else {
        return Ok(None);
    };

    if now() - session.created_at > Duration::hours(state.config.session_hours) {
        session::Entity::delete_by_id(session.token)
            .exec(&state.db)
            .await?;
        return Ok(None);
    }

    user::Entity::find_by_id(session.user_id).one(&state.db).await
}

fn render_login(
    req: &HttpRequest,
    viewer: Option<&user::Model>,
    message: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let message = form_message(message);
    let body = render("login.html", &[("FORM_MESSAGE", message.as_str())])?;
    page_response(req, "Log In", viewer, &body)
}

fn render_register(
    req: &HttpRequest,
    viewer: Option<&user::Model>,
    message: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let message = form_message(message);
    let body = render("register.html", &[("FORM_MESSAGE", message.as_str())])?;
    page_response(req, "Register", viewer, &body)
}

pub async fn login_form(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let viewer = current_user(&req, &state).await?;
    render_login(&req, viewer.as_ref(), None)
}

pub async fn login_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(form.username.as_str()))
        .one(&state.db)
        .await?;

    match found {
        Some(user) if verify_password(&form.password, &user.password) => {
            purge_expired_sessions(&state.db, state.config.session_hours).await?;
            let cookie = start_session(&state.db, &user).await?;
            info!("User {} logged in", user.username);
            Ok(redirect_with_cookies("/", [cookie]))
        }
        _ => {
            warn!("Failed login attempt for {}", form.username);
            render_login(&req, None, Some("Invalid username and/or password."))
        }
    }
}

pub async fn logout_user(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        session::Entity::delete_by_id(cookie.value().to_string())
            .exec(&state.db)
            .await?;
    }

    Ok(redirect_with_cookies("/", [session_removal_cookie()]))
}

pub async fn register_form(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let viewer = current_user(&req, &state).await?;
    render_register(&req, viewer.as_ref(), None)
}

pub async fn register_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    if form.password != form.confirmation {
        return render_register(&req, None, Some("Passwords must match."));
    }
    if !validate_username(&form.username) {
        return render_register(&req, None, Some("Enter a valid username."));
    }

    let created = user::ActiveModel {
        username: Set(form.username),
        email: Set(form.email),
        password: Set(hash_password(&form.password)?),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await;

    let user = match created {
        Ok(user) => user,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return render_register(&req, None, Some("Username already taken."));
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = start_session(&state.db, &user).await?;
    info!("Registered user {}", user.username);
    Ok(redirect_with_cookies("/", [cookie]))
}
