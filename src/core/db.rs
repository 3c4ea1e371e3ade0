use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, Schema, Set,
};
use tracing::info;

use crate::core::helpers::{hash_password, now};
use crate::models::{follow, like, post, session, user};

pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("Connecting to database: {database_url}");
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        // Every pooled connection would otherwise see its own empty database.
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;
    create_schema(&db).await?;
    info!("Database ready");
    Ok(db)
}

/// Create any missing tables from the entity definitions.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(post::Entity),
        schema.create_table_from_entity(like::Entity),
        schema.create_table_from_entity(follow::Entity),
        schema.create_table_from_entity(session::Entity),
    ];

    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    Ok(())
}

async fn find_or_create_user(
    db: &DatabaseConnection,
    username: &str,
    posts: &[&str],
) -> anyhow::Result<user::Model> {
    if let Some(existing) = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password: Set(hash_password(username)?),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for content in posts {
        post::ActiveModel {
            user_id: Set(created.id),
            content: Set(content.to_string()),
            created_at: Set(now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("Created demo user {username}");
    Ok(created)
}

/// Demo accounts `test`, `alice` and `bob` (password = username), with
/// `test` following `bob`. Safe to run on every start.
pub async fn seed_demo_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    let test = find_or_create_user(db, "test", &["This is my first post!"]).await?;
    find_or_create_user(
        db,
        "alice",
        &[
            "Welcome to my page! Excited to share thoughts here.",
            "Just finished an amazing project. Feeling productive today!",
        ],
    )
    .await?;
    let bob = find_or_create_user(
        db,
        "bob",
        &["Hey everyone! Just joined, looking forward to connecting with you all."],
    )
    .await?;

    let already_following = follow::Entity::find()
        .filter(follow::Column::UserId.eq(test.id))
        .filter(follow::Column::FollowingId.eq(bob.id))
        .one(db)
        .await?
        .is_some();

    if !already_following {
        follow::ActiveModel {
            user_id: Set(test.id),
            following_id: Set(bob.id),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::PaginatorTrait;

    #[actix_web::test]
    async fn seeding_is_idempotent() {
        let db = connect("sqlite::memory:").await.unwrap();
        seed_demo_data(&db).await.unwrap();
        seed_demo_data(&db).await.unwrap();

        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(post::Entity::find().count(&db).await.unwrap(), 4);
        assert_eq!(follow::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn schema_creation_can_repeat() {
        let db = connect("sqlite::memory:").await.unwrap();
        create_schema(&db).await.unwrap();
    }
}
