//! A small social network: users register, post short messages, like
//! posts, follow each other and read paginated feeds.
//!
//! Handlers are plain actix-web functions over a sea-orm connection held
//! in [`state::AppState`]; [`routes`] is the whole routing table.

use actix_web::web;

use crate::core::errors::{form_error, path_error, query_error};

pub mod auth;
pub mod config;
pub mod core;
pub mod follow;
pub mod models;
pub mod posts;
pub mod state;
pub mod templates;
pub mod users;

/// Fixed routes first; `/{username}` catches everything else. Extractor
/// failures render through `AppError` as 400 JSON bodies.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(web::resource("/").route(web::get().to(posts::index)))
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login_user)),
        )
        .service(
            web::resource("/logout")
                .route(web::get().to(auth::logout_user))
                .route(web::post().to(auth::logout_user)),
        )
        .service(
            web::resource("/register")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register_user)),
        )
        .service(web::resource("/posts/create").route(web::post().to(posts::create_post)))
        .service(web::resource("/posts/like").route(web::post().to(posts::like_post_form)))
        .service(web::resource("/posts/like/{post_id}").route(web::post().to(posts::like_post)))
        .service(web::resource("/posts/edit/{post_id}").route(web::post().to(posts::edit_post)))
        .service(web::resource("/following").route(web::get().to(follow::following_view)))
        .service(web::resource("/follow/{user_id}").route(web::post().to(follow::handle_follow)))
        .service(
            web::resource("/static/{file:.*}")
                .route(web::get().to(crate::core::static_server::serve_static)),
        )
        .service(web::resource("/{username}").route(web::get().to(users::profile_view)));
}
