use sea_orm::DbErr;
use thiserror::Error;

/// A rejected input, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {id} does not exist")]
pub struct NotFoundError {
    pub kind: &'static str,
    pub id: String,
}

impl NotFoundError {
    pub fn new(kind: &'static str, id: impl ToString) -> Self {
        NotFoundError { kind, id: id.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum ScoreboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl ScoreboardError {
    pub fn invalid_value(field: &'static str, value: impl ToString) -> Self {
        ScoreboardError::InvalidValue { field, value: value.to_string() }
    }
}
