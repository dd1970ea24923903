use url::Url;

use crate::error::{Error, Result};
use crate::http::client::DEFAULT_SERVICE;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a GET for `path` on `host`.
///
/// The request asks the server to close the connection after responding,
/// which is what lets the client treat end-of-stream as end-of-response.
/// An empty path is sent as `/`.
pub fn build_get_request(path: &str, host: &str) -> Vec<u8> {
    let path = if path.is_empty() { "/" } else { path };

    format!(
        "GET {path} {HTTP_VERSION}\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\
         Host: {host}\r\n\
         \r\n"
    )
    .into_bytes()
}

/// Where a GET goes: the host to connect to, the service (port) and the
/// path with its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub service: String,
    pub path: String,
}

impl Target {
    /// Parses an `http://host[:port]/path?query` URL.
    ///
    /// # Example
    ///
    /// ```
    /// # use sockline::http::request::Target;
    /// let target = Target::parse("http://localhost:8080/index.html?lang=es").unwrap();
    /// assert_eq!(target.hostname, "localhost");
    /// assert_eq!(target.service, "8080");
    /// assert_eq!(target.path, "/index.html?lang=es");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;

        if url.scheme() != "http" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        let hostname = url.host_str().ok_or(Error::MissingHost)?.to_string();

        // `Url::port` is `None` when the URL uses the scheme's default port.
        let service = match url.port() {
            Some(port) => port.to_string(),
            None => DEFAULT_SERVICE.to_string(),
        };

        let mut path = url.path().to_string();
        if path.is_empty() {
            path.push('/');
        }
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            hostname,
            service,
            path,
        })
    }
}
