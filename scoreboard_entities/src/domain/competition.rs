use sea_orm::{prelude::*, sea_query::OnConflict, ActiveValue};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::awards::AwardConfig;
use crate::error::{ScoreboardError, ValidationError};
use crate::schema;

const COMPETITION_NAME_KEY: &str = "competition_name";
const AWARD_CONFIG_KEY: &str = "award_config";
const ADMIN_PASSWORD_KEY: &str = "admin_password";

pub const UNNAMED_COMPETITION: &str = "未命名赛事";

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionInfo {
    pub name: String,
    pub award_config: AwardConfig,
}

impl Default for CompetitionInfo {
    fn default() -> Self {
        CompetitionInfo {
            name: "2025年湖南省青少年创新实践大赛".to_string(),
            award_config: AwardConfig::default(),
        }
    }
}

async fn get_meta<C>(db: &C, key: &str) -> Result<Option<String>, DbErr> where C: ConnectionTrait {
    Ok(schema::meta::Entity::find_by_id(key.to_string()).one(db).await?.map(|m| m.value))
}

async fn set_meta<C>(db: &C, key: &str, value: String) -> Result<(), DbErr> where C: ConnectionTrait {
    schema::meta::Entity::insert(schema::meta::ActiveModel {
        key: ActiveValue::Set(key.to_string()),
        value: ActiveValue::Set(value),
    })
    .on_conflict(
        OnConflict::column(schema::meta::Column::Key)
            .update_column(schema::meta::Column::Value)
            .to_owned(),
    )
    .exec(db)
    .await?;
    Ok(())
}

impl CompetitionInfo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Name must not be empty"));
        }
        self.award_config.validate()
    }

    /// Reads the info from the `meta` table. Missing or unreadable values
    /// fall back to defaults.
    pub async fn load<C>(db: &C) -> Result<CompetitionInfo, ScoreboardError> where C: ConnectionTrait {
        let name = get_meta(db, COMPETITION_NAME_KEY).await?.unwrap_or_else(|| UNNAMED_COMPETITION.to_string());
        let award_config = match get_meta(db, AWARD_CONFIG_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Stored award config is unreadable, using defaults: {}", e);
                AwardConfig::default()
            }),
            None => AwardConfig::default(),
        };
        Ok(CompetitionInfo { name, award_config })
    }

    pub async fn save<C>(&self, db: &C) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        self.validate()?;
        let config = serde_json::to_string(&self.award_config)
            .map_err(|e| ScoreboardError::invalid_value("award_config", e))?;
        set_meta(db, COMPETITION_NAME_KEY, self.name.trim().to_string()).await?;
        set_meta(db, AWARD_CONFIG_KEY, config).await?;
        Ok(())
    }

    /// Writes `defaults` and the admin password hash for keys not yet present.
    pub async fn seed<C>(db: &C, defaults: &CompetitionInfo, admin_password_hash: String) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        if get_meta(db, COMPETITION_NAME_KEY).await?.is_none() {
            set_meta(db, COMPETITION_NAME_KEY, defaults.name.clone()).await?;
        }
        if get_meta(db, AWARD_CONFIG_KEY).await?.is_none() {
            let config = serde_json::to_string(&defaults.award_config)
                .map_err(|e| ScoreboardError::invalid_value("award_config", e))?;
            set_meta(db, AWARD_CONFIG_KEY, config).await?;
        }
        if get_meta(db, ADMIN_PASSWORD_KEY).await?.is_none() {
            info!("Seeding initial admin password");
            set_meta(db, ADMIN_PASSWORD_KEY, admin_password_hash).await?;
        }
        Ok(())
    }

    pub async fn admin_password_hash<C>(db: &C) -> Result<Option<String>, ScoreboardError> where C: ConnectionTrait {
        Ok(get_meta(db, ADMIN_PASSWORD_KEY).await?)
    }

    pub async fn set_admin_password_hash<C>(db: &C, hash: String) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        Ok(set_meta(db, ADMIN_PASSWORD_KEY, hash).await?)
    }
}
