use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::lifecycle::OrderAction,
    entity::enums::OrderStatus,
    response::ApiResponse,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("Insufficient credit limit: available {available}, required {required}")]
    InsufficientCredit { available: Decimal, required: Decimal },

    #[error("Credit not approved")]
    CreditNotApproved,

    #[error(
        "No credit account with this wholesaler. Credit request sent to wholesaler. \
         The order was not placed; purchase with credit is not allowed until approval."
    )]
    CreditAccountMissing,

    #[error("Cannot {action} an order that is {from}")]
    InvalidTransition { from: OrderStatus, action: OrderAction },

    #[error("Invalid agent selected")]
    InvalidAgent,

    #[error("Valid amount required")]
    InvalidAmount,

    #[error("Amount exceeds credit used")]
    ExceedsUsed,

    #[error("Database error")]
    DbError(sqlx::Error),

    #[error("Database error")]
    OrmError(sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::InsufficientCredit { .. }
            | AppError::CreditNotApproved
            | AppError::CreditAccountMissing
            | AppError::InvalidAgent
            | AppError::InvalidAmount
            | AppError::ExceedsUsed => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::InsufficientCredit { .. } => "insufficient_credit",
            AppError::CreditNotApproved => "credit_not_approved",
            AppError::CreditAccountMissing => "credit_account_missing",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::InvalidAgent => "invalid_agent",
            AppError::InvalidAmount => "invalid_amount",
            AppError::ExceedsUsed => "exceeds_used",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "unexpected",
        }
    }
}

/// A unique-constraint race lost against a concurrent writer is a duplicate,
/// not a server fault.
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::OrmError(err),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::Conflict("Resource already exists".into())
        } else {
            AppError::DbError(err)
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            other => tracing::debug!(code = other.code(), error = %other, "request rejected"),
        }

        let body = ApiResponse::failure(self.to_string(), ErrorData { error: self.code() });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
