use axum::{extract::{Path, State}, http::StatusCode, routing::{delete, get}, Json, Router};
use scoreboard_entities::domain::referee::{NewReferee, Referee};
use sea_orm::{prelude::*, DatabaseConnection};
use tracing::info;

use crate::{auth::{hash_password, ExtractAuthenticatedUser}, response::{handle_error, APIError}, state::AppState};

pub async fn get_referees_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
) -> Result<Json<Vec<Referee>>, APIError> {
    user.require_admin()?;
    Ok(Json(Referee::get_all(&db).await?))
}

pub async fn create_referee_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(request): Json<NewReferee>,
) -> Result<Json<Referee>, APIError> {
    user.require_admin()?;
    let request = request.validate().map_err(scoreboard_entities::ScoreboardError::from)?;
    let hash = hash_password(&request.password).map_err(handle_error)?;
    let referee = Referee::create(&db, &request, hash).await?;
    info!(referee = %referee.username, sub_event = %referee.sub_event_id, "Created referee");
    Ok(Json(referee))
}

pub async fn delete_referee_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Path(referee_id): Path<Uuid>,
) -> Result<StatusCode, APIError> {
    user.require_admin()?;
    Referee::delete(&db, referee_id).await?;
    Ok(StatusCode::OK)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/referees", get(get_referees_handler).post(create_referee_handler))
        .route("/referees/:referee_id", delete(delete_referee_handler))
}
