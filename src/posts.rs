use std::collections::{HashMap, HashSet};

use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::current_user;
use crate::config::{MAX_POST_LENGTH, POSTS_PER_PAGE};
use crate::core::errors::AppError;
use crate::core::flash::redirect_with_flash;
use crate::core::helpers::{now, redirect};
use crate::core::pagination::{num_pages, resolve_page_number, Page, PageQuery};
use crate::models::{like, post, user};
use crate::state::AppState;
use crate::templates::{page_response, render, render_pagination, render_post_list};

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LikeForm {
    pub post_id: i32,
}

/// A post as shown in a feed.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: post::Model,
    pub author: user::Model,
    pub likes: u64,
    /// Whether the viewing user has liked this post.
    pub liked: bool,
}

/// Newest-first page of the posts matched by `select`, with authors and
/// like counts attached.
pub async fn feed_page(
    db: &DatabaseConnection,
    select: Select<post::Entity>,
    raw_page: Option<&str>,
    viewer: Option<&user::Model>,
) -> Result<Page<FeedEntry>, DbErr> {
    let paginator = select
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .find_also_related(user::Entity)
        .paginate(db, POSTS_PER_PAGE);

    let total = paginator.num_items().await?;
    let num_pages = num_pages(total, POSTS_PER_PAGE);
    let number = resolve_page_number(raw_page, num_pages);
    let rows = paginator.fetch_page(number - 1).await?;

    let post_ids: Vec<i32> = rows.iter().map(|(post, _)| post.id).collect();
    let likes = if post_ids.is_empty() {
        Vec::new()
    } else {
        like::Entity::find()
            .filter(like::Column::PostId.is_in(post_ids))
            .all(db)
            .await?
    };

    let mut counts: HashMap<i32, u64> = HashMap::new();
    let mut liked: HashSet<i32> = HashSet::new();
    for like in &likes {
        *counts.entry(like.post_id).or_default() += 1;
        if viewer.is_some_and(|v| v.id == like.user_id) {
            liked.insert(like.post_id);
        }
    }

    let items = rows
        .into_iter()
        .filter_map(|(post, author)| {
            let author = author?;
            Some(FeedEntry {
                likes: counts.get(&post.id).copied().unwrap_or(0),
                liked: liked.contains(&post.id),
                post,
                author,
            })
        })
        .collect();

    Ok(Page { items, number, num_pages, total })
}

pub async fn like_count(db: &DatabaseConnection, post_id: i32) -> Result<u64, DbErr> {
    like::Entity::find()
        .filter(like::Column::PostId.eq(post_id))
        .count(db)
        .await
}

/// Add the like if absent, remove it if present. Returns whether the post
/// is liked afterwards.
pub async fn toggle_like(db: &DatabaseConnection, user_id: i32, post_id: i32) -> Result<bool, DbErr> {
    let existing = like::Entity::find()
        .filter(like::Column::UserId.eq(user_id))
        .filter(like::Column::PostId.eq(post_id))
        .one(db)
        .await?;

    if existing.is_some() {
        // Removes duplicates left behind by concurrent toggles as well.
        like::Entity::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .exec(db)
            .await?;
        Ok(false)
    } else {
        like::ActiveModel {
            user_id: Set(user_id),
            post_id: Set(post_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(true)
    }
}

fn validate_content(content: &str) -> Result<(), &'static str> {
    if content.trim().is_empty() {
        return Err("Post content cannot be empty.");
    }
    if content.chars().count() > MAX_POST_LENGTH {
        return Err("Post content is too long (max 5000 characters).");
    }
    Ok(())
}

pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let viewer = current_user(&req, &state).await?;
    let page = feed_page(
        &state.db,
        post::Entity::find(),
        query.page.as_deref(),
        viewer.as_ref(),
    )
    .await?;

    let compose = if viewer.is_some() {
        render("compose.html", &[])?
    } else {
        String::new()
    };
    let posts = render_post_list(&page, viewer.as_ref());
    let pagination = render_pagination(&page, "/");

    let body = render(
        "index.html",
        &[
            ("COMPOSE_FORM", compose.as_str()),
            ("POST_LIST", posts.as_str()),
            ("PAGINATION", pagination.as_str()),
        ],
    )?;
    page_response(&req, "All Posts", viewer.as_ref(), &body)
}

pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: Result<web::Form<PostForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };
    let form = form?;

    if let Err(message) = validate_content(&form.content) {
        return Ok(redirect_with_flash("/", message));
    }

    let post = post::ActiveModel {
        user_id: Set(user.id),
        content: Set(form.into_inner().content),
        created_at: Set(now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User {} created post {}", user.username, post.id);
    Ok(redirect("/"))
}

/// Overwrites the content of any post; authorship is not checked.
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: Result<web::Form<PostForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };
    let form = form?;

    let post_id = path.into_inner();
    let post = post::Entity::find_by_id(post_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if let Err(message) = validate_content(&form.content) {
        return Ok(redirect_with_flash("/", message));
    }

    let mut post: post::ActiveModel = post.into();
    post.content = Set(form.into_inner().content);
    post.updated_at = Set(Some(now()));
    post.update(&state.db).await?;

    info!("User {} edited post {}", user.username, post_id);
    Ok(redirect("/"))
}

async fn like_response(
    state: &AppState,
    user: &user::Model,
    post_id: i32,
) -> Result<HttpResponse, AppError> {
    let post = post::Entity::find_by_id(post_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let liked = toggle_like(&state.db, user.id, post.id).await?;
    let likes = like_count(&state.db, post.id).await?;
    debug!(user = %user.username, post = post.id, liked, likes, "Toggled like");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "likes": likes })))
}

pub async fn like_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };
    like_response(&state, &user, path.into_inner()).await
}

/// Same as `like_post`, with the post id in the form body.
pub async fn like_post_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: Result<web::Form<LikeForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&req, &state).await? else {
        return Ok(redirect("/login"));
    };
    like_response(&state, &user, form?.post_id).await
}
