use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use itertools::Itertools;
use scoreboard_entities::{prelude::{RosterItem, SubEvent}, ScoreboardError, ValidationError};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{auth::ExtractAuthenticatedUser, entries::SubEventQuery, response::APIError, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterBatchRequest {
    pub items: Vec<RosterItem>,
}

pub async fn get_roster_handler(
    State(db): State<DatabaseConnection>,
    Query(query): Query<SubEventQuery>,
) -> Result<Json<Vec<RosterItem>>, APIError> {
    Ok(Json(RosterItem::get_all(&db, query.sub_event_id).await?))
}

pub async fn upload_roster_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(request): Json<RosterBatchRequest>,
) -> Result<StatusCode, APIError> {
    let sub_event_ids = request.items.iter().map(|i| i.sub_event_id).unique().collect_vec();
    for sub_event_id in &sub_event_ids {
        user.check_can_write_sub_event(*sub_event_id)?;
        SubEvent::get(&db, *sub_event_id).await?;
    }

    let items = request.items.into_iter().map(|item| {
        let id = item.id.trim().to_string();
        if id.is_empty() {
            return Err(ScoreboardError::from(ValidationError::new("id", "Participant id must not be empty")));
        }
        Ok(RosterItem { id, name: item.name.trim().to_string(), ..item })
    }).collect::<Result<Vec<_>, _>>()?;

    RosterItem::upsert_many(&db, &items).await?;
    info!(count = items.len(), by = %user.username, "Imported roster items");
    Ok(StatusCode::OK)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/roster", get(get_roster_handler))
        .route("/roster/batch", post(upload_roster_handler))
}
