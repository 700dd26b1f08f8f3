use sea_orm::{prelude::*, ActiveValue, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{NotFoundError, ScoreboardError, ValidationError};
use crate::schema;

/// A separately ranked event within the competition.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct SubEvent {
    pub id: Uuid,
    pub name: String,
}

impl From<schema::sub_event::Model> for SubEvent {
    fn from(model: schema::sub_event::Model) -> Self {
        SubEvent { id: model.uuid, name: model.name }
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name must not be empty"));
    }
    Ok(name.to_string())
}

impl SubEvent {
    pub fn new(name: &str) -> Result<SubEvent, ValidationError> {
        Ok(SubEvent { id: Uuid::new_v4(), name: validate_name(name)? })
    }

    pub async fn get_all<C>(db: &C) -> Result<Vec<SubEvent>, ScoreboardError> where C: ConnectionTrait {
        let rows = schema::sub_event::Entity::find().order_by_asc(schema::sub_event::Column::Name).all(db).await?;
        Ok(rows.into_iter().map(SubEvent::from).collect())
    }

    pub async fn get<C>(db: &C, id: Uuid) -> Result<SubEvent, ScoreboardError> where C: ConnectionTrait {
        schema::sub_event::Entity::find_by_id(id).one(db).await?
            .map(SubEvent::from)
            .ok_or_else(|| NotFoundError::new("SubEvent", id).into())
    }

    pub async fn save<C>(&self, db: &C) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        schema::sub_event::ActiveModel {
            uuid: ActiveValue::Set(self.id),
            name: ActiveValue::Set(self.name.clone()),
        }.insert(db).await?;
        Ok(())
    }

    pub async fn rename<C>(db: &C, id: Uuid, name: &str) -> Result<SubEvent, ScoreboardError> where C: ConnectionTrait {
        let name = validate_name(name)?;
        let existing = Self::get(db, id).await?;
        schema::sub_event::ActiveModel {
            uuid: ActiveValue::Unchanged(existing.id),
            name: ActiveValue::Set(name.clone()),
        }.update(db).await?;
        Ok(SubEvent { id, name })
    }

    /// Deletes the sub-event with its entries, roster items, referees and
    /// access keys.
    pub async fn delete<C>(db: &C, id: Uuid) -> Result<(), ScoreboardError> where C: ConnectionTrait + TransactionTrait {
        let transaction = db.begin().await?;
        schema::entry::Entity::delete_many().filter(schema::entry::Column::SubEventId.eq(id)).exec(&transaction).await?;
        schema::roster_item::Entity::delete_many().filter(schema::roster_item::Column::SubEventId.eq(id)).exec(&transaction).await?;
        schema::access_key::Entity::delete_many().filter(schema::access_key::Column::SubEventId.eq(id)).exec(&transaction).await?;
        schema::referee::Entity::delete_many().filter(schema::referee::Column::SubEventId.eq(id)).exec(&transaction).await?;
        let result = schema::sub_event::Entity::delete_by_id(id).exec(&transaction).await?;
        if result.rows_affected == 0 {
            transaction.rollback().await?;
            return Err(NotFoundError::new("SubEvent", id).into());
        }
        transaction.commit().await?;

        info!(sub_event = %id, "Deleted sub-event");
        Ok(())
    }
}
