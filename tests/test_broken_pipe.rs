//! Writes to a vanished peer with SIGPIPE at its default action.
//!
//! The test harness ignores SIGPIPE like every Rust binary does. Restoring the
//! default disposition affects the whole process, so this lives in its own
//! test binary with a single test.
#![cfg(unix)]

use std::thread;
use std::time::Duration;

use sockline::net::{Connection, Outcome, Transport};

#[test]
fn test_closed_peer_does_not_raise_sigpipe() {
    // SAFETY: only this test runs in this binary, and no other thread is
    // touching signal dispositions.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let listener = Connection::listen("0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    let server = thread::spawn(move || listener.accept().map(drop));

    let mut client = Connection::connect("127.0.0.1", &port).unwrap();
    server.join().unwrap().unwrap();

    let mut closed = false;
    for _ in 0..200 {
        match client.send_some(b"hello").unwrap() {
            Outcome::Closed => {
                closed = true;
                break;
            }
            Outcome::Transferred(n) => assert_eq!(n, 5),
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(closed, "peer close never surfaced on write");

    assert_eq!(client.send_all(b"still here").unwrap(), Outcome::Closed);
}
