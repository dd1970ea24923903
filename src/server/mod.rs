//! Servers built on [`Connection`](crate::net::Connection).

pub mod echo;

pub use echo::EchoStats;
