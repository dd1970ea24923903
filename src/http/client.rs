//! One-shot HTTP/1.1 GET client.
//!
//! The client owns its transport. It sends a single `Connection: close`
//! request and reads until the server closes the stream, which for such a
//! request marks the end of the response.

use bytes::BytesMut;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::request::build_get_request;
use crate::http::response::{body, into_text, sanitize_into};
use crate::net::{Connection, Outcome, Transport};

/// Bytes asked of the transport per receive call.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

pub const DEFAULT_SERVICE: &str = "http";

/// HTTP client bound to one host over one transport.
///
/// Not `Clone`: it exclusively owns the transport. Moving the client moves
/// the connection with it.
#[derive(Debug)]
pub struct HttpClient<T = Connection> {
    hostname: String,
    transport: T,
    buffer_size: usize,
}

impl HttpClient<Connection> {
    /// Connects to `hostname` on `service` (usually [`DEFAULT_SERVICE`]).
    pub fn connect(hostname: &str, service: &str) -> Result<Self> {
        let connection = Connection::connect(hostname, service)?;
        Ok(Self::with_transport(hostname, connection))
    }

    pub fn connect_http(hostname: &str) -> Result<Self> {
        Self::connect(hostname, DEFAULT_SERVICE)
    }
}

impl<T: Transport> HttpClient<T> {
    /// Wraps an already established transport. `hostname` goes into the
    /// `Host` header.
    pub fn with_transport(hostname: impl Into<String>, transport: T) -> Self {
        Self {
            hostname: hostname.into(),
            transport,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Sends a GET for `path` without waiting for the response.
    ///
    /// A request that cannot be sent completely is an error and is not
    /// retried.
    pub fn request(&mut self, path: &str) -> Result<()> {
        let request = build_get_request(path, &self.hostname);

        match self.transport.send_all(&request)? {
            Outcome::Closed => Err(Error::PeerClosed),
            Outcome::Transferred(n) => {
                info!(host = %self.hostname, path, bytes = n, "Request sent");
                Ok(())
            }
        }
    }

    /// Reads the response until the server closes the connection.
    ///
    /// Non-ASCII bytes are replaced with `@`. Without `include_headers` only
    /// the body is returned, or an empty string if the response has no blank
    /// line separating headers from body.
    pub fn await_response(&mut self, include_headers: bool) -> Result<String> {
        let mut chunk = vec![0u8; self.buffer_size];
        let mut raw = BytesMut::with_capacity(self.buffer_size);

        loop {
            match self.transport.recv_some(&mut chunk)? {
                Outcome::Transferred(n) => sanitize_into(&chunk[..n], &mut raw),
                Outcome::Closed => break,
            }
        }

        debug!(host = %self.hostname, bytes = raw.len(), "Response received");

        let response = into_text(&raw);
        if include_headers {
            return Ok(response);
        }

        Ok(body(&response).to_string())
    }

    /// Sends a GET for `path` and waits for its response.
    pub fn get(&mut self, path: &str, include_headers: bool) -> Result<String> {
        self.request(path)?;
        self.await_response(include_headers)
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}
