//! HTTP protocol implementation.
//!
//! This module implements a small HTTP/1.1 server: one request per
//! connection, answered and closed.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection state machine gluing everything together
//! - **`reader`**: Frames socket bytes into a header block and a body
//! - **`parser`**: Parses the header block into a `Request`
//! - **`request`**: HTTP request representation
//! - **`headers`**: Ordered, case-insensitive header map
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`error`**: Failure taxonomy and its mapping to status codes
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌──────────────────┐
//!        │  AwaitHeaders    │ ← Read until CRLF CRLF
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │  HeadersRead     │ ← Parse request line and headers
//!        └──────┬───────────┘
//!               │ Content-Length present?
//!               ├─ yes → BodyPending → BodyRead
//!               └─ no  → BodyRead
//!               ▼
//!        ┌──────────────────┐
//!        │    Resolved      │ ← Static file, route handler or 404
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │  ResponseSent    │
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```
//!
//! Errors jump to `Resolved` with an error page (400, 408, 500) when the
//! client can still be answered, or straight to `Closed` when the peer has
//! gone away.

pub mod connection;
pub mod error;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod writer;
