//! HTTP transport for the ESM web services

pub mod endpoint;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

pub use endpoint::{Endpoint, Protocol, ServiceType};
pub use http::HttpTransport;

/// Status line and body of one HTTP exchange, before interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Outcome of a successful round trip
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// HTTP 200 with a decoded JSON body
    Json(Value),
    /// HTTP 204, no body to decode
    Status(u16),
}

impl Reply {
    pub fn json(&self) -> Option<&Value> {
        match self {
            Reply::Json(value) => Some(value),
            Reply::Status(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Reply::Json(value) => Some(value),
            Reply::Status(_) => None,
        }
    }
}

/// Posts a JSON body and hands back the raw response.
///
/// Implementations must not retry; connection-level failures are
/// reported as [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: &Value) -> Result<RawResponse>;
}

// Matches both `</head><body><h1>` and `<head><body><h1>` pages.
const ERROR_PAGE_START: &str = "<body><h1>";
const ERROR_PAGE_END: &str = "</h1><HR";

/// Pull the message out of the HTML page the server returns on HTTP 500
pub fn extract_html_error(body: &str) -> Option<String> {
    let start = body.find(ERROR_PAGE_START)? + ERROR_PAGE_START.len();
    let rest = &body[start..];
    let end = rest.find(ERROR_PAGE_END)?;
    Some(rest[..end].to_string())
}

/// Classify a raw response by status code
pub fn interpret(raw: RawResponse) -> Result<Reply> {
    match raw.status {
        200 => serde_json::from_str(&raw.body)
            .map(Reply::Json)
            .map_err(|e| Error::MalformedResponse(format!("invalid JSON body: {}", e))),
        204 => Ok(Reply::Status(204)),
        500 => match extract_html_error(&raw.body) {
            Some(message) => Err(Error::Remote {
                status: raw.status,
                message,
            }),
            None => Err(Error::UnparseableRemote {
                status: raw.status,
                body: raw.body,
            }),
        },
        status => Err(Error::UnexpectedResponse {
            status,
            reason: raw.reason,
            body: raw.body,
        }),
    }
}
