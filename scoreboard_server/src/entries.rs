use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, put}, Json, Router};
use scoreboard_entities::prelude::{Entry, EntryDraft};
use sea_orm::{prelude::*, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{auth::ExtractAuthenticatedUser, response::APIError, state::AppState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubEventQuery {
    pub sub_event_id: Option<Uuid>,
}

pub async fn get_entries_handler(
    State(db): State<DatabaseConnection>,
    Query(query): Query<SubEventQuery>,
) -> Result<Json<Vec<Entry>>, APIError> {
    Ok(Json(Entry::get_all(&db, query.sub_event_id).await?))
}

/// Stores the entry under the id chosen by the client, replacing any entry
/// of the same participant and round.
pub async fn create_entry_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(entry): Json<Entry>,
) -> Result<Json<Entry>, APIError> {
    user.check_can_write_sub_event(entry.sub_event_id)?;
    let entry = entry.validated().map_err(scoreboard_entities::ScoreboardError::from)?;
    entry.upsert(&db).await?;
    debug!(entry = %entry.id, by = %user.username, "Stored entry");
    Ok(Json(entry))
}

pub async fn update_entry_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Path(entry_id): Path<Uuid>,
    Json(draft): Json<EntryDraft>,
) -> Result<Json<Entry>, APIError> {
    let existing = Entry::get(&db, entry_id).await?;
    user.check_can_write_sub_event(existing.sub_event_id)?;
    Ok(Json(Entry::replace(&db, entry_id, &draft).await?))
}

pub async fn delete_entry_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode, APIError> {
    let existing = Entry::get(&db, entry_id).await?;
    user.check_can_write_sub_event(existing.sub_event_id)?;
    Entry::delete(&db, entry_id).await?;
    Ok(StatusCode::OK)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/entries", get(get_entries_handler).post(create_entry_handler))
        .route("/entries/:entry_id", put(update_entry_handler).delete(delete_entry_handler))
}
