use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorPayload;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// A request parameter could not be read as the expected kind of value.
    #[error("invalid parameter '{param}': cannot parse \"{raw}\" to a valid {expected}")]
    InvalidParameter {
        param: &'static str,
        raw: String,
        expected: &'static str,
    },

    /// The request parsed but describes a range we refuse to serve.
    #[error("{0}")]
    BadData(String),

    /// Wavefront answered, but reported a query-level error.
    #[error("{0}")]
    Upstream(String),

    /// Wavefront could not be reached or its answer could not be read.
    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Short label used for logging and the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidParameter { .. } | ProxyError::BadData(_) => "bad_data",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Transport(_) => "transport",
            ProxyError::Config(_) => "config",
            ProxyError::Internal(_) => "internal",
        }
    }

    /// Every failure a caller can trigger is reported as `bad_data`, including
    /// an unreachable backend.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidParameter { .. }
            | ProxyError::BadData(_)
            | ProxyError::Upstream(_)
            | ProxyError::Transport(_) => StatusCode::BAD_REQUEST,
            ProxyError::Config(_) | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            ProxyError::Config(_) | ProxyError::Internal(_) => {
                ErrorPayload::new("internal", self.to_string())
            }
            _ => ErrorPayload::bad_data(self.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        ProxyError::Transport(format!("cannot decode wavefront response: {}", err))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_payload())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
