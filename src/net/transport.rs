//! Partial and complete byte transfer over a stream.
//!
//! A single `send`/`recv` on a stream socket may move fewer bytes than asked
//! for. That is normal and not an error. [`Transport`] exposes those partial
//! primitives and builds the "move exactly this many bytes" loops on top of
//! them, so every transport (a real socket or a test double) shares the same
//! short-write/short-read handling.

use crate::error::{Error, Result};

/// Result of one transfer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// This many bytes were moved.
    Transferred(usize),
    /// The peer closed the connection and nothing was moved.
    Closed,
}

impl Outcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, Outcome::Closed)
    }

    pub fn bytes(&self) -> usize {
        match self {
            Outcome::Transferred(n) => *n,
            Outcome::Closed => 0,
        }
    }
}

pub trait Transport {
    /// Sends up to `buf.len()` bytes and reports how many went out.
    ///
    /// A peer that closed while we were writing (broken pipe) is reported as
    /// [`Outcome::Closed`], not as an error: whether that is a failure
    /// depends on the protocol running on top.
    fn send_some(&mut self, buf: &[u8]) -> Result<Outcome>;

    /// Receives up to `buf.len()` bytes into the front of `buf`.
    ///
    /// An orderly shutdown by the peer is reported as [`Outcome::Closed`].
    fn recv_some(&mut self, buf: &mut [u8]) -> Result<Outcome>;

    /// Sends all of `buf`.
    ///
    /// Returns `Transferred(buf.len())` on success and `Closed` if the peer
    /// closed before a single byte went out. If the peer closes after some
    /// but not all bytes were sent, the call fails with
    /// [`Error::PartialTransfer`]: we cannot know what the peer made of a
    /// truncated message. An empty `buf` returns immediately without any
    /// call to [`send_some`](Transport::send_some).
    fn send_all(&mut self, buf: &[u8]) -> Result<Outcome> {
        let mut sent = 0;

        while sent < buf.len() {
            match self.send_some(&buf[sent..])? {
                Outcome::Transferred(n) if n > 0 => {
                    sent += n;
                    tracing::trace!(chunk = n, sent, total = buf.len(), "Sent chunk");
                }
                _ if sent == 0 => return Ok(Outcome::Closed),
                _ => {
                    return Err(Error::PartialTransfer {
                        transferred: sent,
                        expected: buf.len(),
                    });
                }
            }
        }

        Ok(Outcome::Transferred(sent))
    }

    /// Fills all of `buf`.
    ///
    /// Same outcomes as [`send_all`](Transport::send_all). On
    /// [`Error::PartialTransfer`] the prefix of `buf` that was filled is
    /// left in place but its content is unspecified; callers must treat the
    /// whole read as lost.
    fn recv_all(&mut self, buf: &mut [u8]) -> Result<Outcome> {
        let expected = buf.len();
        let mut received = 0;

        while received < expected {
            match self.recv_some(&mut buf[received..])? {
                Outcome::Transferred(n) if n > 0 => {
                    received += n;
                    tracing::trace!(chunk = n, received, total = expected, "Received chunk");
                }
                _ if received == 0 => return Ok(Outcome::Closed),
                _ => {
                    return Err(Error::PartialTransfer {
                        transferred: received,
                        expected,
                    });
                }
            }
        }

        Ok(Outcome::Transferred(received))
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_some(&mut self, buf: &[u8]) -> Result<Outcome> {
        (**self).send_some(buf)
    }

    fn recv_some(&mut self, buf: &mut [u8]) -> Result<Outcome> {
        (**self).recv_some(buf)
    }
}
