use axum::{extract::{Path, State}, http::StatusCode, routing::{get, put}, Json, Router};
use scoreboard_entities::prelude::{CompetitionInfo, SubEvent};
use scoreboard_entities::awards::AwardConfig;
use sea_orm::{prelude::*, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{auth::ExtractAuthenticatedUser, response::APIError, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubEventRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInfoRequest {
    pub name: String,
    pub config: AwardConfig,
}

pub async fn get_info_handler(State(db): State<DatabaseConnection>) -> Result<Json<CompetitionInfo>, APIError> {
    Ok(Json(CompetitionInfo::load(&db).await?))
}

pub async fn update_info_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(request): Json<UpdateInfoRequest>,
) -> Result<StatusCode, APIError> {
    user.require_admin()?;
    CompetitionInfo { name: request.name, award_config: request.config }.save(&db).await?;
    Ok(StatusCode::OK)
}

pub async fn get_sub_events_handler(State(db): State<DatabaseConnection>) -> Result<Json<Vec<SubEvent>>, APIError> {
    Ok(Json(SubEvent::get_all(&db).await?))
}

pub async fn create_sub_event_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(request): Json<SubEventRequest>,
) -> Result<Json<SubEvent>, APIError> {
    user.require_admin()?;
    let sub_event = SubEvent::new(&request.name).map_err(scoreboard_entities::ScoreboardError::from)?;
    sub_event.save(&db).await?;
    info!(sub_event = %sub_event.id, name = %sub_event.name, "Created sub-event");
    Ok(Json(sub_event))
}

pub async fn rename_sub_event_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Path(sub_event_id): Path<Uuid>,
    Json(request): Json<SubEventRequest>,
) -> Result<Json<SubEvent>, APIError> {
    user.require_admin()?;
    Ok(Json(SubEvent::rename(&db, sub_event_id, &request.name).await?))
}

pub async fn delete_sub_event_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Path(sub_event_id): Path<Uuid>,
) -> Result<StatusCode, APIError> {
    user.require_admin()?;
    SubEvent::delete(&db, sub_event_id).await?;
    Ok(StatusCode::OK)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(get_info_handler).post(update_info_handler))
        .route("/events", get(get_sub_events_handler).post(create_sub_event_handler))
        .route("/events/:sub_event_id", put(rename_sub_event_handler).delete(delete_sub_event_handler))
}
