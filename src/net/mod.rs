//! Blocking TCP transport over IPv4.
//!
//! - **`resolver`**: host/service lookup into an ordered list of candidates
//! - **`transport`**: partial and complete transfer primitives
//! - **`connection`**: the socket-owning [`Connection`] type
//!
//! # Example
//!
//! ```no_run
//! use sockline::net::{Connection, Transport};
//!
//! # fn main() -> sockline::Result<()> {
//! let listener = Connection::listen("8080")?;
//! let mut peer = listener.accept()?;
//!
//! let mut buf = [0u8; 4];
//! if !peer.recv_all(&mut buf)?.is_closed() {
//!     peer.send_all(&buf)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod resolver;
pub mod transport;

pub use connection::{Connection, DEFAULT_BACKLOG};
pub use resolver::{Candidate, Resolver};
pub use transport::{Outcome, Transport};
