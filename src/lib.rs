//! Sockline - blocking TCP transport and a minimal HTTP/1.1 client.
//!
//! Core library for the transport, the HTTP client and the echo server.

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod server;

pub use error::{Error, ResolveError, Result};
