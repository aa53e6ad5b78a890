//! Error types for the storefront.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Storefront error type.
#[derive(Debug)]
pub enum Error {
    /// Startup configuration error.
    Config(String),
    /// Request cannot be served as given (e.g. no contract address).
    BadRequest(String),
    /// RPC transport error.
    Rpc(String),
    /// Upstream query layer error.
    Query(String),
    /// Mint request refused before submission.
    Mint(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::BadRequest(msg) => write!(f, "{msg}"),
            Error::Rpc(msg) => write!(f, "rpc error: {msg}"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
            Error::Mint(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Mint(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Rpc(_) | Error::Query(_) => StatusCode::BAD_GATEWAY,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}
