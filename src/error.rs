use crate::engine::BillingError;
use crate::orchestration::ServiceError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        let msg = err.to_string();
        match err {
            BillingError::Validation(_)
            | BillingError::MalformedRate { .. }
            | BillingError::OverDeduction { .. }
            | BillingError::DivisionByZero { .. } => AppError::BadRequest(msg),
            BillingError::PreconditionNotMet { .. } => AppError::Conflict(msg),
            BillingError::BalanceIntegrity { .. } => AppError::Unprocessable(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let msg = err.to_string();
        match err {
            StoreError::NotFound(_) => AppError::NotFound(msg),
            StoreError::Conflict { .. } => AppError::Conflict(msg),
            StoreError::Seed(_) => AppError::Internal(msg),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(id) => AppError::NotFound(format!("deal {}", id)),
            ServiceError::Billing(e) => e.into(),
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
