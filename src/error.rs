use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::AuthError,
    response::{ApiResponse, Meta},
    services::checkout_service::BlockReason,
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{}", .0.message())]
    Blocked(BlockReason),

    #[error("cart sync failed: {0}")]
    CartSync(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Blocked(_) => StatusCode::CONFLICT,
            AppError::CartSync(StoreError::InvalidPath(_))
            | AppError::Store(StoreError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            AppError::CartSync(_) | AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Auth(err) if err.is_credential_error() => StatusCode::UNAUTHORIZED,
            AppError::Auth(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, action) = match &self {
            AppError::Blocked(reason) => (reason.code().to_string(), reason.action()),
            other => (other.to_string(), None),
        };

        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData { error, action }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
