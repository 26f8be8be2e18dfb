/*
[INPUT]:  Core errors and request-level failures
[OUTPUT]: JSON error responses with matching HTTP status codes
[POS]:    HTTP layer - error to response mapping
[UPDATE]: When adding error kinds or changing status mapping
*/

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use banana_split_core::{BananaError, REJECTION_NOTICE};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced by route handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing bearer token")]
    MissingBearer,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] BananaError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'static str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingBearer => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                BananaError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                BananaError::DomainRejected { .. } => StatusCode::FORBIDDEN,
                BananaError::MalformedSignature(_)
                | BananaError::MalformedKey(_)
                | BananaError::MalformedAddress(_)
                | BananaError::Serialization(_) => StatusCode::BAD_REQUEST,
                BananaError::SigningInFlight => StatusCode::CONFLICT,
                BananaError::Http(_)
                | BananaError::Api { .. }
                | BananaError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
                BananaError::SigningUnavailable
                | BananaError::UserRejected(_)
                | BananaError::UrlParse(_)
                | BananaError::Storage(_)
                | BananaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let notice = matches!(self, ApiError::Core(BananaError::DomainRejected { .. }))
            .then_some(REJECTION_NOTICE);
        let body = ErrorBody {
            error: self.to_string(),
            notice,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
