use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scoreboard_entities::{ScoreboardError, export::ExportError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct APIError {
    pub message: String,
    pub code: StatusCode
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APIErrorResponse {
    pub message: String
}

impl APIError {
    pub fn new(message: String) -> Self {
        APIError {
            message,
            code: StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn new_with_status(code: StatusCode, message: &str) -> Self {
        APIError { message: message.to_string(), code }
    }
}

impl From<anyhow::Error> for APIError {
    fn from(err: anyhow::Error) -> Self {
        error!("Error while handling request {}", err);
        APIError::new(err.to_string())
    }
}

impl From<ScoreboardError> for APIError {
    fn from(err: ScoreboardError) -> Self {
        match err {
            ScoreboardError::Validation(e) => {
                warn!("Rejected request: {}", e);
                APIError { message: e.to_string(), code: StatusCode::BAD_REQUEST }
            },
            ScoreboardError::NotFound(e) => APIError { message: e.to_string(), code: StatusCode::NOT_FOUND },
            e @ (ScoreboardError::Db(_) | ScoreboardError::InvalidValue { .. }) => handle_error(e),
        }
    }
}

impl From<sea_orm::DbErr> for APIError {
    fn from(err: sea_orm::DbErr) -> Self {
        handle_error(err)
    }
}

impl From<ExportError> for APIError {
    fn from(err: ExportError) -> Self {
        handle_error(err)
    }
}

impl IntoResponse for APIError
{
    fn into_response(self) -> Response {
        let body = axum::Json(APIErrorResponse { message: self.message });
        (self.code, body).into_response()
    }
}

impl From<(StatusCode, &str)> for APIError {
    fn from((code, message): (StatusCode, &str)) -> Self {
        warn!("Error while handling request {}", message);
        APIError { message: message.to_string(), code }
    }
}

impl From<(StatusCode, String)> for APIError {
    fn from((code, message): (StatusCode, String)) -> Self {
        warn!("Error while handling request {}", message);
        APIError { message, code }
    }
}

pub fn handle_error<E>(err: E) -> APIError
where
    E: std::error::Error
{
    error!("Error while handling request {}", err);
    APIError::new(err.to_string())
}

#[cfg(test)]
mod tests {
    use scoreboard_entities::{NotFoundError, ValidationError};

    use super::*;

    #[test]
    fn test_entity_errors_map_to_status_codes() {
        let err: APIError = ScoreboardError::from(ValidationError::new("score", "bad")).into();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("score"));

        let err: APIError = ScoreboardError::from(NotFoundError::new("Entry", 1)).into();
        assert_eq!(err.code, StatusCode::NOT_FOUND);

        let err: APIError = ScoreboardError::invalid_value("round", 7).into();
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
