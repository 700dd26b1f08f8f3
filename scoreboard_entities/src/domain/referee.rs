use sea_orm::{prelude::*, ActiveValue, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, ScoreboardError, ValidationError};
use crate::schema;

pub const ADMIN_USERNAME: &str = "admin";

/// A scorer account locked to one sub-event. The password is write-only.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Referee {
    pub id: Uuid,
    pub username: String,
    pub sub_event_id: Uuid,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewReferee {
    pub username: String,
    pub password: String,
    pub sub_event_id: Uuid,
}

impl NewReferee {
    pub fn validate(&self) -> Result<NewReferee, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::new("username", "Username must not be empty"));
        }
        if username == ADMIN_USERNAME {
            return Err(ValidationError::new("username", "Username is reserved"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "Password must not be empty"));
        }
        Ok(NewReferee { username: username.to_string(), ..self.clone() })
    }
}

impl From<schema::referee::Model> for Referee {
    fn from(model: schema::referee::Model) -> Self {
        Referee { id: model.uuid, username: model.username, sub_event_id: model.sub_event_id }
    }
}

impl Referee {
    pub async fn get_all<C>(db: &C) -> Result<Vec<Referee>, ScoreboardError> where C: ConnectionTrait {
        let rows = schema::referee::Entity::find().order_by_asc(schema::referee::Column::Username).all(db).await?;
        Ok(rows.into_iter().map(Referee::from).collect())
    }

    /// The referee with this username together with its stored password hash.
    pub async fn find_by_username<C>(db: &C, username: &str) -> Result<Option<(Referee, String)>, ScoreboardError> where C: ConnectionTrait {
        let row = schema::referee::Entity::find()
            .filter(schema::referee::Column::Username.eq(username))
            .one(db)
            .await?;
        Ok(row.map(|row| {
            let hash = row.password_hash.clone();
            (Referee::from(row), hash)
        }))
    }

    pub async fn create<C>(db: &C, referee: &NewReferee, password_hash: String) -> Result<Referee, ScoreboardError> where C: ConnectionTrait {
        let referee = referee.validate()?;
        if schema::sub_event::Entity::find_by_id(referee.sub_event_id).one(db).await?.is_none() {
            return Err(NotFoundError::new("SubEvent", referee.sub_event_id).into());
        }
        if Self::find_by_username(db, &referee.username).await?.is_some() {
            return Err(ValidationError::new("username", "Username is already taken").into());
        }

        let model = schema::referee::ActiveModel {
            uuid: ActiveValue::Set(Uuid::new_v4()),
            username: ActiveValue::Set(referee.username),
            password_hash: ActiveValue::Set(password_hash),
            sub_event_id: ActiveValue::Set(referee.sub_event_id),
        }.insert(db).await?;
        Ok(model.into())
    }

    /// Removes the referee and revokes its access keys.
    pub async fn delete<C>(db: &C, id: Uuid) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        let row = schema::referee::Entity::find_by_id(id).one(db).await?
            .ok_or_else(|| NotFoundError::new("Referee", id))?;
        schema::access_key::Entity::delete_many()
            .filter(schema::access_key::Column::Username.eq(row.username))
            .exec(db)
            .await?;
        schema::referee::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}
