//! The TCP connection type.
//!
//! A [`Connection`] owns exactly one OS socket. It is created either actively
//! ([`Connection::connect`]), passively ([`Connection::listen`]) or from an
//! incoming peer ([`Connection::accept`]), and torn down by
//! [`Connection::release`] or by going out of scope.
//!
//! Sockets are set up through `socket2`, then handed to the std listener or
//! stream type. Std writes to a stream with `MSG_NOSIGNAL` where the platform
//! has it, so a peer that went away surfaces as `EPIPE` instead of killing a
//! process that left SIGPIPE at its default action.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use socket2::{SockRef, Socket};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::net::resolver::{Candidate, Resolver};
use crate::net::transport::{Outcome, Transport};

/// Pending connections the OS queues for a listener before `accept`.
pub const DEFAULT_BACKLOG: i32 = 20;

/// Step of the per-candidate setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Open,
    Connect,
    ReuseAddress,
    Bind,
    Listen,
}

#[derive(Debug)]
struct Failure {
    stage: Stage,
    source: io::Error,
}

impl Failure {
    fn at(stage: Stage) -> impl FnOnce(io::Error) -> Failure {
        move |source| Failure { stage, source }
    }
}

#[derive(Debug)]
enum Handle {
    Stream(TcpStream),
    Listener(TcpListener),
}

impl Handle {
    fn sock_ref(&self) -> SockRef<'_> {
        match self {
            Handle::Stream(stream) => SockRef::from(stream),
            Handle::Listener(listener) => SockRef::from(listener),
        }
    }
}

/// A connected, listening or torn-down TCP socket.
///
/// There is no `Clone`: the socket must be released by exactly one owner.
/// Moving a `Connection` hands the socket over.
#[derive(Debug)]
pub struct Connection {
    handle: Option<Handle>,
}

impl Connection {
    /// Connects to `hostname`/`service`, trying each resolved address in order
    /// and keeping the first that accepts the connection.
    pub fn connect(hostname: &str, service: &str) -> Result<Self> {
        let resolver = Resolver::new(Some(hostname), service, false)?;

        let (socket, candidate) = first_working(resolver, |socket, candidate| {
            socket
                .connect(&candidate.sock_addr())
                .map_err(Failure::at(Stage::Connect))
        })
        .map_err(|failure| match failure.stage {
            Stage::Open => Error::SocketCreate(failure.source),
            _ => Error::ConnectFailed(failure.source),
        })?;

        info!(host = hostname, service, address = %candidate.address(), "Connected");
        Ok(Self::from_handle(Handle::Stream(socket.into())))
    }

    /// Listens on `service` on every local interface with the default backlog.
    pub fn listen(service: &str) -> Result<Self> {
        Self::listen_with_backlog(service, DEFAULT_BACKLOG)
    }

    pub fn listen_with_backlog(service: &str, backlog: i32) -> Result<Self> {
        let resolver = Resolver::new(None, service, true)?;

        let (socket, candidate) = first_working(resolver, |socket, candidate| {
            // A port that was recently in use lingers in TIME_WAIT; without
            // SO_REUSEADDR a restarted server could not bind it.
            socket
                .set_reuse_address(true)
                .map_err(Failure::at(Stage::ReuseAddress))?;
            socket
                .bind(&candidate.sock_addr())
                .map_err(Failure::at(Stage::Bind))?;
            socket
                .listen(backlog)
                .map_err(Failure::at(Stage::Listen))
        })
        .map_err(|failure| match failure.stage {
            Stage::Open => Error::SocketCreate(failure.source),
            _ => Error::ListenSetupFailed(failure.source),
        })?;

        info!(service, address = %candidate.address(), backlog, "Listening");
        Ok(Self::from_handle(Handle::Listener(socket.into())))
    }

    /// Blocks until a peer connects and returns the connection to it.
    ///
    /// The listener itself is left untouched and can keep accepting while the
    /// returned connection is in use elsewhere.
    pub fn accept(&self) -> Result<Connection> {
        let listener = match self.handle()? {
            Handle::Listener(listener) => listener,
            Handle::Stream(_) => {
                return Err(Error::Io(io::Error::new(
                    ErrorKind::InvalidInput,
                    "accept on a connection that is not listening",
                )));
            }
        };

        let (stream, peer) = listener.accept()?;
        info!(%peer, "Accepted connection");

        Ok(Self::from_handle(Handle::Stream(stream)))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        inet_addr(self.handle()?.sock_ref().local_addr()?)
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        inet_addr(self.handle()?.sock_ref().peer_addr()?)
    }

    /// Disables reading and/or writing without releasing the socket.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        self.handle()?.sock_ref().shutdown(how)?;
        Ok(())
    }

    /// Releases the socket without shutting the connection down first.
    pub fn close(&mut self) {
        self.handle.take();
    }

    /// Shuts down both directions and releases the socket.
    ///
    /// Does nothing on a connection that is already released, so it is safe
    /// to call more than once. Also runs on drop.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Listeners and peers that already went away report ENOTCONN here.
            if let Err(e) = handle.sock_ref().shutdown(Shutdown::Both) {
                debug!(error = %e, "Shutdown during release failed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    fn from_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn handle(&self) -> Result<&Handle> {
        self.handle.as_ref().ok_or(Error::Released)
    }

    fn stream(&self) -> Result<&TcpStream> {
        match self.handle()? {
            Handle::Stream(stream) => Ok(stream),
            Handle::Listener(_) => Err(Error::Io(ErrorKind::NotConnected.into())),
        }
    }
}

impl Transport for Connection {
    fn send_some(&mut self, buf: &[u8]) -> Result<Outcome> {
        let mut stream = self.stream()?;

        loop {
            match stream.write(buf) {
                Ok(0) if !buf.is_empty() => return Ok(Outcome::Closed),
                Ok(n) => return Ok(Outcome::Transferred(n)),
                // The peer went away while we were writing: whether that is an
                // error is for the protocol on top to decide. A reset that
                // arrived before this write is reported once as ECONNRESET,
                // later writes see EPIPE.
                Err(e) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::ConnectionReset) => {
                    return Ok(Outcome::Closed);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn recv_some(&mut self, buf: &mut [u8]) -> Result<Outcome> {
        let mut stream = self.stream()?;

        loop {
            match stream.read(buf) {
                Ok(0) if !buf.is_empty() => return Ok(Outcome::Closed),
                Ok(n) => return Ok(Outcome::Transferred(n)),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

/// Tries every candidate until one opens a socket and passes `setup`.
///
/// Sockets of abandoned candidates are closed before the next one is tried.
/// When all fail, the failure of the last candidate is returned.
fn first_working<F>(resolver: Resolver, mut setup: F) -> std::result::Result<(Socket, Candidate), Failure>
where
    F: FnMut(&Socket, &Candidate) -> std::result::Result<(), Failure>,
{
    let mut last_failure = None;

    for candidate in resolver {
        let socket = match Socket::new(
            candidate.domain(),
            candidate.socket_type(),
            Some(candidate.protocol()),
        ) {
            Ok(socket) => socket,
            Err(source) => {
                debug!(address = %candidate.address(), error = %source, "Could not open socket");
                last_failure = Some(Failure {
                    stage: Stage::Open,
                    source,
                });
                continue;
            }
        };

        match setup(&socket, &candidate) {
            Ok(()) => return Ok((socket, candidate)),
            Err(failure) => {
                debug!(
                    address = %candidate.address(),
                    stage = ?failure.stage,
                    error = %failure.source,
                    "Abandoning candidate"
                );
                drop(socket);
                last_failure = Some(failure);
            }
        }
    }

    Err(last_failure.unwrap_or_else(|| Failure {
        stage: Stage::Connect,
        source: io::Error::new(ErrorKind::AddrNotAvailable, "no candidate addresses"),
    }))
}

fn inet_addr(addr: socket2::SockAddr) -> Result<SocketAddr> {
    addr.as_socket()
        .ok_or_else(|| Error::Io(io::Error::new(ErrorKind::InvalidData, "not an inet address")))
}
