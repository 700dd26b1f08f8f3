use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use scoreboard_entities::{
    export::{export_file_name, export_standings_csv, CsvExportOptions, ExportLocale},
    prelude::{CompetitionInfo, Group, RankedRow, Standings, SubEvent},
};
use sea_orm::{prelude::*, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::{response::APIError, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub sub_event: SubEvent,
    pub junior: Vec<RankedRow>,
    pub senior: Vec<RankedRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default)]
    pub group: Group,
    #[serde(default)]
    pub locale: ExportLocale,
    #[serde(default)]
    pub without_awards: bool,
}

pub async fn get_standings_handler(
    State(db): State<DatabaseConnection>,
    Path(sub_event_id): Path<Uuid>,
) -> Result<Json<StandingsResponse>, APIError> {
    let sub_event = SubEvent::get(&db, sub_event_id).await?;
    let info = CompetitionInfo::load(&db).await?;
    let standings = Standings::load(&db, sub_event_id).await?;

    Ok(Json(StandingsResponse {
        sub_event,
        junior: standings.ranked(Group::Junior, Some(&info.award_config)),
        senior: standings.ranked(Group::Senior, Some(&info.award_config)),
    }))
}

/// RFC 5987 encoding for non-ASCII download names.
fn encode_file_name(name: &str) -> String {
    name.bytes().map(|b| match b {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
        _ => format!("%{:02X}", b),
    }).collect()
}

pub async fn export_standings_handler(
    State(db): State<DatabaseConnection>,
    Path(sub_event_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, APIError> {
    SubEvent::get(&db, sub_event_id).await?;
    let info = CompetitionInfo::load(&db).await?;
    let standings = Standings::load(&db, sub_event_id).await?;

    let config = if query.without_awards { None } else { Some(&info.award_config) };
    let options = CsvExportOptions { locale: query.locale, include_bom: true };
    let body = export_standings_csv(&standings, query.group, config, &options)?;

    let file_name = export_file_name(query.group, query.locale, chrono::Local::now().date_naive());
    let disposition = HeaderValue::from_str(&format!("attachment; filename*=UTF-8''{}", encode_file_name(&file_name)))
        .map_err(|e| APIError::new(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ).into_response())
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/events/:sub_event_id/standings", get(get_standings_handler))
        .route("/events/:sub_event_id/export", get(export_standings_handler))
}
