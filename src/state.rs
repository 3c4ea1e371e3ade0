use sea_orm::DatabaseConnection;

use crate::auth::purge_expired_sessions;
use crate::config::Config;
use crate::core::db;

pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = db::connect(&config.database_url).await?;
        purge_expired_sessions(&db, config.session_hours).await?;

        if config.seed_demo_data {
            db::seed_demo_data(&db).await?;
        }

        Ok(Self { db, config })
    }
}
