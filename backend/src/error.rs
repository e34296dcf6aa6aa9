//! Error handling for the Pharmacy Inventory Management System
//!
//! Provides consistent JSON error responses across all endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Inventory errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Batch conflict: {0}")]
    BatchConflict(String),

    #[error("Order partially consumed: {0}")]
    PartiallyConsumed(String),

    // Concurrency errors
    #[error("Transaction retries exhausted")]
    Busy,

    #[error("Daily document sequence exhausted for {0}")]
    CapacityExceeded(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<shared::AllocationError> for AppError {
    fn from(err: shared::AllocationError) -> Self {
        match err {
            shared::AllocationError::InsufficientStock {
                requested,
                available,
            } => AppError::InsufficientStock {
                requested,
                available,
            },
            shared::AllocationError::NonPositiveQuantity => {
                AppError::ValidationError("Quantity must be positive".to_string())
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: format!(
                        "Requested quantity {} exceeds available stock {}",
                        requested, available
                    ),
                    field: None,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::BatchConflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "BATCH_CONFLICT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::PartiallyConsumed(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "PARTIALLY_CONSUMED".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "BUSY".to_string(),
                    message: "The operation could not complete due to contention, try again"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::CapacityExceeded(kind) => (
                StatusCode::INSUFFICIENT_STORAGE,
                ErrorDetail {
                    code: "CAPACITY_EXCEEDED".to_string(),
                    message: format!("Daily document sequence exhausted for {}", kind),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
