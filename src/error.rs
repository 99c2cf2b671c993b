//! Error types surfaced by handlers and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{reconcile::ReconcileError, repository::RepositoryError};

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// AppError
///
/// Every failure a handler can answer with. Policy checks produce `NotFound`
/// and `Forbidden`; payload checks produce `Validation`; role reconciliation
/// produces `PartialFailure`. Anything coming out of the store that is not a
/// plain "no such row" is a `Store` fault and is reported as a generic 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error(transparent)]
    PartialFailure(#[from] ReconcileError),

    #[error("Store error: {0}")]
    Store(RepositoryError),
}

impl AppError {
    /// Rewrites `Forbidden` as `NotFound` so that a caller cannot tell an
    /// article they may not touch apart from one that does not exist.
    pub fn concealed(self) -> Self {
        match self {
            AppError::Forbidden => {
                tracing::debug!("concealing forbidden article access as not found");
                AppError::NotFound
            }
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PartialFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::PartialFailure(_) => "PARTIAL_FAILURE",
            AppError::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AppError::NotFound,
            err => AppError::Store(err),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// ErrorResponse
///
/// JSON body returned for every `AppError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            AppError::Validation(errors) => serde_json::to_value(&errors.fields).ok(),
            AppError::PartialFailure(failure) => Some(serde_json::json!({
                "applied": failure.applied,
                "failed": failure.failed,
            })),
            _ => None,
        };
        let message = match &self {
            AppError::Store(err) => {
                // Store faults are logged in full but never echoed to the client.
                tracing::error!("store failure: {:?}", err);
                "Internal error".to_string()
            }
            AppError::PartialFailure(failure) => {
                tracing::error!("role reconciliation halted: {:?}", failure);
                failure.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
