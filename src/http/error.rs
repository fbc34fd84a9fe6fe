//! Error taxonomy for request handling.

use thiserror::Error;

use crate::http::response::StatusCode;

/// Failures while turning a header block into a `Request`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("request line must have exactly three tokens, got {0}")]
    InvalidRequestLine(usize),
    #[error("invalid request target {0:?}")]
    InvalidTarget(String),
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),
}

/// Everything that can end a request before a handler produces a response.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("request header exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },
    #[error("{method} request without Content-Length")]
    MissingContentLength { method: String },
    #[error("declared body of {declared} bytes exceeds {limit} bytes")]
    BodyTooLarge { declared: usize, limit: usize },
    #[error("timed out waiting for client data")]
    RequestTimeout,
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("connection closed after {received} of {expected} body bytes")]
    TruncatedBody { expected: usize, received: usize },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// The status to answer with, or `None` when the peer is gone and no
    /// response should be attempted.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Parse(_)
            | RequestError::HeaderTooLarge { .. }
            | RequestError::MissingContentLength { .. }
            | RequestError::BodyTooLarge { .. } => Some(StatusCode::BadRequest),
            RequestError::RequestTimeout => Some(StatusCode::RequestTimeout),
            RequestError::ConnectionClosed
            | RequestError::TruncatedBody { .. }
            | RequestError::Io(_) => None,
        }
    }

    /// Short, stable name used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Parse(_) => "parse_error",
            RequestError::HeaderTooLarge { .. } => "header_too_large",
            RequestError::MissingContentLength { .. } => "missing_content_length",
            RequestError::BodyTooLarge { .. } => "body_too_large",
            RequestError::RequestTimeout => "request_timeout",
            RequestError::ConnectionClosed => "connection_closed",
            RequestError::TruncatedBody { .. } => "truncated_body",
            RequestError::Io(_) => "io_error",
        }
    }
}
