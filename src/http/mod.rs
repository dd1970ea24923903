//! Minimal HTTP/1.1 client.
//!
//! Only GET is supported and the response is never parsed beyond locating
//! the blank line between headers and body.
//!
//! - **`request`**: request framing and URL targets
//! - **`response`**: sanitizing and splitting the raw response
//! - **`client`**: [`HttpClient`], which drives a request over a transport
//!
//! # Example
//!
//! ```no_run
//! use sockline::http::HttpClient;
//!
//! # fn main() -> sockline::Result<()> {
//! let mut http = HttpClient::connect("www.google.com.ar", "http")?;
//! let page = http.get("/", false)?;
//! println!("{page}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use request::Target;
