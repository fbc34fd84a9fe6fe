//! Lantern - a small HTTP/1.1 server
//!
//! Core library: request framing and parsing, routing, static files and
//! the connection acceptor.

pub mod app;
pub mod config;
pub mod http;
pub mod router;
pub mod server;
pub mod static_files;
