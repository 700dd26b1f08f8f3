use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::prelude::*;
use scoreboard_entities::prelude::CompetitionInfo;

use crate::{auth::hash_password, config::Config, db::{self, DatabaseConfig}};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<AppState, anyhow::Error> {
        let db = db::set_up_db(DatabaseConfig::new(config.db_url.clone())).await?;
        Self::new_with_db(db, config).await
    }

    /// Seeds competition defaults and the initial admin password if missing.
    pub async fn new_with_db(db: DatabaseConnection, config: Config) -> Result<AppState, anyhow::Error> {
        let defaults = CompetitionInfo {
            name: config.competition_name.clone(),
            award_config: config.award_config,
        };
        let admin_hash = hash_password(&config.initial_admin_password)?;
        CompetitionInfo::seed(&db, &defaults, admin_hash).await?;

        Ok(AppState { db, config: Arc::new(config) })
    }

    pub async fn new_test_app() -> AppState {
        let config = Config {
            db_url: "sqlite::memory:".into(),
            ..Default::default()
        };
        Self::new(config).await.expect("Failed to set up test database")
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(app_state: &AppState) -> DatabaseConnection {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Arc<Config> {
        app_state.config.clone()
    }
}
