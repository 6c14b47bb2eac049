//! URL splitting for outbound requests.

use super::error::Error;
use super::{HTTP_DEFAULT_PORT, HTTPS_DEFAULT_PORT};

/// The pieces of an `http://` or `https://` URL the client needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    /// `true` for `https://`.
    pub secure: bool,
    /// Hostname or literal IP, without port.
    pub host: &'a str,
    /// Explicit port, or the scheme default.
    pub port: u16,
    /// Path including the leading `/` and any query string.
    pub path: &'a str,
}

/// Splits `url` into scheme, host, port and path.
///
/// The port separator is only searched for in the host segment (the text
/// before the first `/`), so a `:` inside the path is left alone.
///
/// # Errors
///
/// * [`Error::ProtocolNotValid`] - the URL starts with neither `http://` nor `https://`
/// * [`Error::MalformedUrl`] - empty host, or a port that is not a decimal in `1..=65535`
///
/// # Examples
///
/// ```rust
/// use nbhttp::network::application::http::url;
///
/// let url = url::parse("https://example.com:8443/api/v1?at=12:30").unwrap();
/// assert!(url.secure);
/// assert_eq!(url.host, "example.com");
/// assert_eq!(url.port, 8443);
/// assert_eq!(url.path, "/api/v1?at=12:30");
/// ```
pub fn parse(url: &str) -> Result<Url<'_>, Error> {
    let (secure, rest) = if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else {
        return Err(Error::ProtocolNotValid);
    };

    let (authority, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, parse_port(port)?),
        None if secure => (authority, HTTPS_DEFAULT_PORT),
        None => (authority, HTTP_DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(Error::MalformedUrl);
    }

    Ok(Url {
        secure,
        host,
        port,
        path,
    })
}

fn parse_port(text: &str) -> Result<u16, Error> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedUrl);
    }
    match text.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::MalformedUrl),
        Ok(port) => Ok(port),
    }
}
