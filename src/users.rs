use actix_web::{web, HttpRequest, HttpResponse};
use html_escape::encode_text;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::auth::current_user;
use crate::core::errors::AppError;
use crate::core::pagination::PageQuery;
use crate::follow::{follower_count, following_count, is_following};
use crate::models::{post, user};
use crate::posts::feed_page;
use crate::state::AppState;
use crate::templates::{page_response, profile_href, render, render_pagination, render_post_list};

fn follow_control(target: &user::Model, viewer: Option<&user::Model>, following: bool) -> String {
    match viewer {
        Some(viewer) if viewer.id != target.id => format!(
            r#"<form method="post" action="/follow/{}">
                <button type="submit" class="follow-button">{}</button>
            </form>"#,
            target.id,
            if following { "Unfollow" } else { "Follow" }
        ),
        _ => String::new(),
    }
}

pub async fn profile_view(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let viewer = current_user(&req, &state).await?;
    let username = path.into_inner();

    let target = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    let following = match &viewer {
        Some(v) if v.id != target.id => is_following(&state.db, v.id, target.id).await?,
        _ => false,
    };
    let followers = follower_count(&state.db, target.id).await?;
    let followings = following_count(&state.db, target.id).await?;

    let select = post::Entity::find().filter(post::Column::UserId.eq(target.id));
    let page = feed_page(&state.db, select, query.page.as_deref(), viewer.as_ref()).await?;

    let escaped_username = encode_text(&target.username);
    let followers = followers.to_string();
    let followings = followings.to_string();
    let control = follow_control(&target, viewer.as_ref(), following);
    let posts = render_post_list(&page, viewer.as_ref());
    let pagination = render_pagination(&page, &profile_href(&target.username));

    let body = render(
        "profile.html",
        &[
            ("PROFILE_USERNAME", &*escaped_username),
            ("PROFILE_FOLLOWERS", followers.as_str()),
            ("PROFILE_FOLLOWING", followings.as_str()),
            ("FOLLOW_CONTROL", control.as_str()),
            ("POST_LIST", posts.as_str()),
            ("PAGINATION", pagination.as_str()),
        ],
    )?;
    page_response(&req, &target.username, viewer.as_ref(), &body)
}
