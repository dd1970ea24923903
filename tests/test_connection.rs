//! End-to-end tests for connections over loopback

use std::net::Shutdown;
use std::thread;
use std::time::Duration;

use sockline::net::{Connection, Outcome, Transport};
use sockline::Error;

fn ephemeral_listener() -> (Connection, String) {
    let listener = Connection::listen("0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port.to_string())
}

#[test]
fn test_ping_reaches_accepted_peer() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || {
        let mut peer = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        let outcome = peer.recv_all(&mut buf).unwrap();
        (outcome, buf)
    });

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    assert_eq!(client.send_all(b"ping").unwrap(), Outcome::Transferred(4));

    let (outcome, buf) = server.join().unwrap();
    assert_eq!(outcome, Outcome::Transferred(4));
    assert_eq!(&buf, b"ping");
}

#[test]
fn test_connect_by_hostname() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || listener.accept().map(|_| ()));

    let client = Connection::connect("localhost", &port).unwrap();
    assert!(!client.is_closed());
    server.join().unwrap().unwrap();
}

#[test]
fn test_peer_close_after_partial_data_is_an_error() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || {
        let mut peer = listener.accept().unwrap();
        peer.send_all(b"abc").unwrap();
        // Dropping the peer shuts the connection down.
    });

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    server.join().unwrap();

    let mut buf = [0u8; 10];
    let err = client.recv_all(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        Error::PartialTransfer {
            transferred: 3,
            expected: 10
        }
    ));
}

#[test]
fn test_peer_close_without_data_is_clean() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || {
        let mut peer = listener.accept().unwrap();
        peer.release();
    });

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    server.join().unwrap();

    let mut buf = [0u8; 10];
    assert_eq!(client.recv_all(&mut buf).unwrap(), Outcome::Closed);
    assert_eq!(client.recv_some(&mut buf).unwrap(), Outcome::Closed);
}

#[test]
fn test_shutdown_write_signals_end_of_stream() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || {
        let mut peer = listener.accept().unwrap();
        let mut buf = [0u8; 16];
        let first = peer.recv_some(&mut buf).unwrap();
        let second = peer.recv_some(&mut buf).unwrap();
        (first, second)
    });

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    client.send_all(b"bye").unwrap();
    client.shutdown(Shutdown::Write).unwrap();

    let (first, second) = server.join().unwrap();
    assert_eq!(first, Outcome::Transferred(3));
    assert_eq!(second, Outcome::Closed);
}

/// Connects to a peer that is accepted and dropped right away.
fn connect_to_vanished_peer() -> Connection {
    let (listener, port) = ephemeral_listener();
    let server = thread::spawn(move || listener.accept().map(drop));

    let client = Connection::connect("127.0.0.1", &port).unwrap();
    server.join().unwrap().unwrap();
    client
}

/// Writes until the vanished peer's reset makes a write report `Closed`.
/// Returns how many writes went out before that.
fn send_until_closed(client: &mut Connection) -> usize {
    for attempt in 0..200 {
        match client.send_some(b"hello") {
            Ok(Outcome::Closed) => return attempt,
            Ok(Outcome::Transferred(n)) => assert_eq!(n, 5),
            Err(e) => panic!("write to a closed peer failed instead of closing: {e}"),
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("peer close never surfaced on write");
}

#[test]
fn test_write_to_closed_peer_reports_closed() {
    let mut client = connect_to_vanished_peer();

    send_until_closed(&mut client);
    assert_eq!(client.send_some(b"again").unwrap(), Outcome::Closed);
}

#[test]
fn test_send_all_to_closed_peer_without_progress_is_clean() {
    let mut client = connect_to_vanished_peer();
    send_until_closed(&mut client);

    assert_eq!(client.send_all(b"nobody is listening").unwrap(), Outcome::Closed);
}

#[test]
fn test_listener_and_stream_roles_are_kept_apart() {
    let (listener, port) = ephemeral_listener();
    let server = thread::spawn(move || {
        let peer = listener.accept().unwrap();
        assert!(matches!(peer.accept(), Err(Error::Io(_))));
        listener
    });

    let _client = Connection::connect("127.0.0.1", &port).unwrap();
    let mut listener = server.join().unwrap();
    assert!(matches!(listener.send_some(b"x"), Err(Error::Io(_))));
}

#[test]
fn test_listener_keeps_accepting() {
    let (listener, port) = ephemeral_listener();

    let server = thread::spawn(move || {
        let mut greetings = Vec::new();
        for _ in 0..2 {
            let mut peer = listener.accept().unwrap();
            let mut buf = [0u8; 2];
            peer.recv_all(&mut buf).unwrap();
            greetings.push(buf);
        }
        greetings
    });

    for greeting in [b"hi", b"yo"] {
        let mut client = Connection::connect("127.0.0.1", &port).unwrap();
        client.send_all(greeting).unwrap();
    }

    assert_eq!(server.join().unwrap(), vec![*b"hi", *b"yo"]);
}

#[test]
fn test_release_is_idempotent() {
    let (listener, port) = ephemeral_listener();
    let server = thread::spawn(move || listener.accept().map(|_| ()));

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    server.join().unwrap().unwrap();

    client.release();
    assert!(client.is_closed());
    client.release();
    assert!(client.is_closed());

    assert!(matches!(client.send_some(b"x"), Err(Error::Released)));
    assert!(matches!(client.recv_some(&mut [0u8; 1]), Err(Error::Released)));
    assert!(matches!(client.shutdown(Shutdown::Both), Err(Error::Released)));
}

#[test]
fn test_close_without_shutdown() {
    let (mut listener, _port) = ephemeral_listener();

    listener.close();
    assert!(listener.is_closed());
    assert!(matches!(listener.accept(), Err(Error::Released)));
    listener.release();
}

#[test]
fn test_connect_to_closed_port_fails() {
    let (listener, port) = ephemeral_listener();
    drop(listener);

    let err = Connection::connect("127.0.0.1", &port).unwrap_err();
    assert!(matches!(err, Error::ConnectFailed(_)));
}

#[test]
fn test_listen_on_busy_port_fails() {
    let (_listener, port) = ephemeral_listener();

    let err = Connection::listen(&port).unwrap_err();
    assert!(matches!(err, Error::ListenSetupFailed(_)));
}

#[test]
fn test_connect_to_invalid_host_fails_resolution() {
    let err = Connection::connect("example.invalid", "http").unwrap_err();
    assert!(matches!(err, Error::NameResolution(_)));
}
