//! Error types shared by the transport and the HTTP client.
//!
//! Name lookup failures keep the resolver layer (bad service name, no IPv4
//! result) apart from the OS layer (the system lookup itself failed), since
//! the two are reported through different channels.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The service is neither a port number nor a known TCP service name.
    #[error("unknown service `{0}`")]
    UnknownService(String),

    /// The lookup succeeded but produced no IPv4 endpoint.
    #[error("no IPv4 address found for `{0}`")]
    NoIpv4Address(String),

    /// The system lookup failed.
    #[error("lookup of `{host}` failed: {source}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("host/service name resolution failed: {0}")]
    NameResolution(#[from] ResolveError),

    /// Every candidate failed before a socket could even be opened.
    #[error("socket creation failed: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("connection failed: {0}")]
    ConnectFailed(#[source] io::Error),

    #[error("socket setup failed: {0}")]
    ListenSetupFailed(#[source] io::Error),

    /// The peer closed after some, but not all, of the bytes were moved.
    #[error("peer closed after {transferred} of {expected} bytes")]
    PartialTransfer { transferred: usize, expected: usize },

    /// The peer closed before any byte was moved.
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("connection already released")]
    Released,

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported scheme `{0}`, only http is supported")]
    UnsupportedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error(transparent)]
    Io(#[from] io::Error),
}
