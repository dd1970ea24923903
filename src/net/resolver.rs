//! Host and service name resolution.
//!
//! A [`Resolver`] performs the lookup once and then hands out the resulting
//! IPv4/TCP endpoints one at a time, in the order the system returned them.
//! Callers try each [`Candidate`] until one works: a name can resolve to
//! several addresses and the lookup cannot tell which of them is actually
//! reachable.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

use socket2::{Domain, Protocol, SockAddr, Type};

use crate::error::{ResolveError, Result};

/// Well-known TCP services accepted by name.
const SERVICES: &[(&str, u16)] = &[
    ("echo", 7),
    ("discard", 9),
    ("daytime", 13),
    ("ftp-data", 20),
    ("ftp", 21),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("domain", 53),
    ("gopher", 70),
    ("finger", 79),
    ("http", 80),
    ("www", 80),
    ("pop3", 110),
    ("nntp", 119),
    ("imap", 143),
    ("https", 443),
    ("http-alt", 8080),
];

/// One resolved endpoint: an IPv4 address and port reachable over TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    addr: SocketAddrV4,
}

impl Candidate {
    pub fn address(&self) -> SocketAddrV4 {
        self.addr
    }

    pub fn domain(&self) -> Domain {
        Domain::IPV4
    }

    pub fn socket_type(&self) -> Type {
        Type::STREAM
    }

    pub fn protocol(&self) -> Protocol {
        Protocol::TCP
    }

    pub fn sock_addr(&self) -> SockAddr {
        SockAddr::from(self.addr)
    }
}

/// Iterator over the candidates of a single lookup.
///
/// Once [`has_next`](Resolver::has_next) returns `false`, every further call
/// to `next()` returns `None`; the resolver is exhausted and does not wrap
/// around. The candidate list is released when the resolver is dropped.
#[derive(Debug)]
pub struct Resolver {
    candidates: Vec<Candidate>,
    cursor: usize,
}

impl Resolver {
    /// Resolves `hostname` and `service` to IPv4/TCP candidates.
    ///
    /// With `passive` set and no hostname the candidates are suitable for
    /// binding a listener on every local interface. Without a hostname and
    /// without `passive` they point at the loopback interface.
    ///
    /// `service` is either a decimal port or one of the well-known TCP names
    /// in the built-in table (`http`, `ssh`, `smtp`, ...). The system services
    /// database is not read, so names missing from the table, such as `imaps`
    /// or `postgresql`, fail with [`ResolveError::UnknownService`].
    pub fn new(hostname: Option<&str>, service: &str, passive: bool) -> Result<Self> {
        let port = service_port(service)?;

        let candidates = match hostname {
            None if passive => vec![Ipv4Addr::UNSPECIFIED],
            None => vec![Ipv4Addr::LOCALHOST],
            Some(host) => lookup_ipv4(host, port)?,
        }
        .into_iter()
        .map(|ip| Candidate {
            addr: SocketAddrV4::new(ip, port),
        })
        .collect::<Vec<_>>();

        tracing::debug!(
            host = hostname.unwrap_or("<any>"),
            service,
            passive,
            candidates = candidates.len(),
            "Resolved name"
        );

        Ok(Self {
            candidates,
            cursor: 0,
        })
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.candidates.len()
    }
}

impl Iterator for Resolver {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let candidate = self.candidates.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.candidates.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Resolver {}

/// Maps a service to its TCP port: either a decimal port or a known name.
pub fn service_port(service: &str) -> std::result::Result<u16, ResolveError> {
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }

    SERVICES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(service))
        .map(|&(_, port)| port)
        .ok_or_else(|| ResolveError::UnknownService(service.to_string()))
}

fn lookup_ipv4(host: &str, port: u16) -> std::result::Result<Vec<Ipv4Addr>, ResolveError> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(vec![ip]);
    }

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            source,
        })?;

    let mut ips: Vec<Ipv4Addr> = Vec::new();
    for addr in addrs {
        // Only IPv4 survives; duplicates show up when the system resolver
        // returns one entry per socket type.
        match addr {
            SocketAddr::V4(v4) if !ips.contains(v4.ip()) => ips.push(*v4.ip()),
            SocketAddr::V4(_) => {}
            SocketAddr::V6(v6) => {
                tracing::trace!(host, address = %v6, "Skipping IPv6 candidate");
            }
        }
    }

    if ips.is_empty() {
        return Err(ResolveError::NoIpv4Address(host.to_string()));
    }

    Ok(ips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_service() {
        assert_eq!(service_port("8080").unwrap(), 8080);
        assert_eq!(service_port("0").unwrap(), 0);
    }

    #[test]
    fn named_service() {
        assert_eq!(service_port("http").unwrap(), 80);
        assert_eq!(service_port("HTTPS").unwrap(), 443);
    }

    #[test]
    fn unknown_service() {
        let err = service_port("no-such-service").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownService(s) if s == "no-such-service"));
    }

    #[test]
    fn names_outside_the_table_are_unknown() {
        for name in ["imaps", "postgresql"] {
            assert!(matches!(service_port(name), Err(ResolveError::UnknownService(_))));
        }
    }

    #[test]
    fn port_out_of_range_is_not_a_port() {
        assert!(service_port("70000").is_err());
    }
}
