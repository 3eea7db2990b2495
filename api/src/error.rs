use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shared::StoreError;
use thiserror::Error;
use tracing::error;

/// Wire shape of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller sent something unusable; answered with 400.
    #[error("{error}")]
    BadRequest {
        error: String,
        details: Option<String>,
    },
    /// Body exceeded the route's size limit; answered with 413.
    #[error("request body too large")]
    PayloadTooLarge { details: String },
    /// The store failed; answered with 500 and the driver's message as details.
    #[error("{error}: {source}")]
    Store {
        error: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request_with(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn invalid_json(err: serde_json::Error) -> Self {
        Self::bad_request_with("invalid JSON", err.to_string())
    }

    /// A body that could not be buffered. Only the size limit gets its own status.
    pub fn unreadable_body(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                details: rejection.body_text(),
            }
        } else {
            Self::bad_request_with("invalid JSON", rejection.body_text())
        }
    }

    pub fn invalid_query(rejection: QueryRejection) -> Self {
        Self::bad_request_with("invalid query", rejection.body_text())
    }

    /// Returns a closure for `map_err` that tags a store failure with `error`.
    pub fn store(error: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Store { error, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { error, details } => ErrorBody { error, details },
            ApiError::PayloadTooLarge { details } => ErrorBody {
                error: "request body too large".to_string(),
                details: Some(details),
            },
            ApiError::Store { error, source } => {
                error!(details = %source, "{error}");
                ErrorBody {
                    error: error.to_string(),
                    details: Some(source.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
