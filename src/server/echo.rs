//! Single-client echo server.
//!
//! Accepts one peer and sends back everything it receives until either side
//! closes. Serving several clients at once would need a thread per accepted
//! connection on top of this; the transport itself stays the same.

use std::net::SocketAddr;

use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::net::{Connection, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoStats {
    pub peer: Option<SocketAddr>,
    pub bytes_echoed: usize,
}

/// Listens as configured and echoes for the first client that connects.
pub fn run(cfg: &ServerConfig) -> Result<EchoStats> {
    let listener = Connection::listen_with_backlog(&cfg.service, cfg.backlog)?;
    serve_one(&listener, cfg.buffer_size)
}

/// Accepts one peer on `listener` and echoes until it disconnects.
///
/// Reads take whatever is available (at most `buffer_size` bytes); each read
/// is sent back in full before the next one.
pub fn serve_one(listener: &Connection, buffer_size: usize) -> Result<EchoStats> {
    let mut peer = listener.accept()?;
    let addr = peer.peer_addr().ok();

    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut bytes_echoed = 0;

    loop {
        let received = peer.recv_some(&mut buf)?;
        if received.is_closed() {
            break;
        }

        let sent = peer.send_all(&buf[..received.bytes()])?;
        if sent.is_closed() {
            break;
        }
        bytes_echoed += sent.bytes();
    }

    info!(peer = ?addr, bytes_echoed, "Client disconnected");

    Ok(EchoStats {
        peer: addr,
        bytes_echoed,
    })
}
