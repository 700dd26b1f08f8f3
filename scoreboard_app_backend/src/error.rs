use scoreboard_entities::{export::ExportError, NotFoundError, ScoreboardError, ValidationError};
use thiserror::Error;

use crate::import::RosterImportError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("Remote store failed: {0}")]
    RemoteIO(String),
    #[error("Could not parse input: {0}")]
    Parse(String),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<NotFoundError> for ClientError {
    fn from(err: NotFoundError) -> Self {
        ClientError::NotFound(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::RemoteIO(err.to_string())
        }
    }
}

impl From<RosterImportError> for ClientError {
    fn from(err: RosterImportError) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<ScoreboardError> for ClientError {
    fn from(err: ScoreboardError) -> Self {
        match err {
            ScoreboardError::Validation(e) => ClientError::Validation(e),
            ScoreboardError::NotFound(e) => e.into(),
            other => ClientError::RemoteIO(other.to_string()),
        }
    }
}

impl ClientError {
    /// Rebuilds a validation error from a server message of the form
    /// `field: message`.
    pub fn validation_from_message(message: &str) -> ClientError {
        match message.split_once(": ") {
            Some((field, message)) if !field.contains(' ') => ClientError::Validation(ValidationError::new(field, message)),
            _ => ClientError::Validation(ValidationError::new("", message)),
        }
    }
}
