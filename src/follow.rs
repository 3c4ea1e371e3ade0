use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, QueryTrait, Set,
};
use tracing::{debug, info};

use crate::auth::current_user;
use crate::core::errors::AppError;
use crate::core::flash::redirect_with_flash;
use crate::core::helpers::{now, redirect};
use crate::core::pagination::PageQuery;
use crate::models::{follow, post, user};
use crate::posts::feed_page;
use crate::state::AppState;
use crate::templates::{page_response, profile_href, render, render_pagination, render_post_list};

pub async fn is_following(
    db: &DatabaseConnection,
    follower_id: i32,
    following_id: i32,
) -> Result<bool, DbErr> {
    let count = follow::Entity::find()
        .filter(follow::Column::UserId.eq(follower_id))
        .filter(follow::Column::FollowingId.eq(following_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Create the edge if absent, delete it if present. Returns whether
/// `follower_id` follows `following_id` afterwards.
pub async fn toggle_follow(
    db: &DatabaseConnection,
    follower_id: i32,
    following_id: i32,
) -> Result<bool, DbErr> {
    if is_following(db, follower_id, following_id).await? {
        follow::Entity::delete_many()
            .filter(follow::Column::UserId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .exec(db)
            .await?;
        Ok(false)
    } else {
        follow::ActiveModel {
            user_id: Set(follower_id),
            following_id: Set(following_id),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(true)
    }
}

pub async fn follower_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowingId.eq(user_id))
        .count(db)
        .await
}

pub async fn following_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::UserId.eq(user_id))
        .count(db)
        .await
}

// === HTTP Handlers ===

pub async fn handle_follow(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };

    let target_id = path.into_inner();
    if target_id == user.id {
        return Ok(redirect_with_flash(
            &profile_href(&user.username),
            "You cannot follow yourself.",
        ));
    }

    let target = user::Entity::find_by_id(target_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let following = toggle_follow(&state.db, user.id, target.id).await?;
    if following {
        info!("{} followed {}", user.username, target.username);
    } else {
        debug!("{} unfollowed {}", user.username, target.username);
    }

    Ok(redirect(&profile_href(&target.username)))
}

/// Posts by everyone the viewer follows, newest first.
pub async fn following_view(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };

    let followed = follow::Entity::find()
        .select_only()
        .column(follow::Column::FollowingId)
        .filter(follow::Column::UserId.eq(user.id))
        .into_query();
    let select = post::Entity::find().filter(post::Column::UserId.in_subquery(followed));

    let page = feed_page(&state.db, select, query.page.as_deref(), Some(&user)).await?;

    let posts = render_post_list(&page, Some(&user));
    let pagination = render_pagination(&page, "/following");
    let body = render(
        "following.html",
        &[("POST_LIST", posts.as_str()), ("PAGINATION", pagination.as_str())],
    )?;
    page_response(&req, "Following", Some(&user), &body)
}
