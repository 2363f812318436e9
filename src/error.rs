// src/error.rs
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn store(err: anyhow::Error) -> Self {
        AppError::Store(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn store_error_keeps_detail() {
        let err: anyhow::Result<()> =
            Err(anyhow::anyhow!("UNIQUE constraint failed")).context("insert zone_templ");
        let err = AppError::store(err.unwrap_err());
        assert_eq!(
            err.to_string(),
            "store error: insert zone_templ: UNIQUE constraint failed"
        );
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::from(ValidationError::EmptyContent);
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
