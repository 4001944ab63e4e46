use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::AppError;

/// Error body: `{"error": {"status": 404, "title": "..."}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub status: u16,
    pub title: String,
}

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error of the ledger taxonomy.
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        AppError::MissingField(_) | AppError::ZeroAmount | AppError::MissingAccountFields => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::AccountNotFound(_) | AppError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        AppError::InsufficientBalance { .. } | AppError::NegativeBalance { .. } => {
            StatusCode::FORBIDDEN
        }
        AppError::FailedDebitOperation { .. } | AppError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                title: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
