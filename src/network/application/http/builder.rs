//! Request and response text assembly.
//!
//! Both directions are written into fixed-capacity buffers. A buffer that
//! cannot hold the full text is an error; nothing is ever silently truncated.

use super::error::Error;
use super::{
    ContentType, HTTP_PROTO_VERSION, HTTP_SERVER_PROTO_VERSION, Method, REQUEST_HEAD_SIZE,
};
use core::fmt::Write;
use heapless::{String, Vec};

/// The request line and headers of an outbound request.
///
/// The body is not part of the head; it goes out in its own transport write.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    pub method: Method,
    pub path: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub user_agent: &'a str,
    /// Raw extra headers, each already terminated by `\r\n`.
    pub extra_headers: &'a str,
    /// Length of the body that follows, if any.
    pub content_length: Option<usize>,
}

impl RequestHead<'_> {
    /// Writes the head as it goes on the wire:
    ///
    /// ```text
    /// <METHOD> <PATH> HTTP/1.0\r\n
    /// Host: <HOST>:<PORT>\r\n
    /// Connection: close\r\n
    /// User-Agent: <agent>\r\n
    /// <extra headers>
    /// [Content-Length: <n>\r\n]
    /// \r\n
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::MemError`] when the text does not fit in [`REQUEST_HEAD_SIZE`] bytes.
    pub fn encode(&self) -> Result<Vec<u8, REQUEST_HEAD_SIZE>, Error> {
        let mut head: String<REQUEST_HEAD_SIZE> = String::new();
        write!(
            head,
            "{} {} {}\r\nHost: {}:{}\r\nConnection: close\r\nUser-Agent: {}\r\n{}",
            self.method.as_str(),
            self.path,
            HTTP_PROTO_VERSION,
            self.host,
            self.port,
            self.user_agent,
            self.extra_headers,
        )
        .map_err(|_| Error::MemError)?;

        if let Some(len) = self.content_length {
            write!(head, "Content-Length: {len}\r\n").map_err(|_| Error::MemError)?;
        }
        head.push_str("\r\n").map_err(|_| Error::MemError)?;

        Ok(head.into_bytes())
    }
}

/// Why a server response could not be framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The status code is outside `100..=599`.
    UnsupportedStatus(u16),
    /// The response does not fit in the destination buffer.
    Capacity,
}

/// Canonical short reason phrase for a status code.
///
/// Codes are grouped by family, except 404 which keeps its own phrase.
/// Anything outside `100..=599` has no phrase.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    match status {
        100..=199 => Some("Continue"),
        200..=299 => Some("OK"),
        300..=399 => Some("Multiple Choices"),
        404 => Some("Not Found"),
        400..=499 => Some("Bad Request"),
        500..=599 => Some("Internal Server Error"),
        _ => None,
    }
}

/// Frames a complete server response into a buffer of `N` bytes.
///
/// ```text
/// HTTP/1.1 <code> <reason>\r\n
/// Content-Length: <n>\r\n
/// Server: <server_name>\r\n
/// Content-Type: <mime>\r\n
/// \r\n
/// <body>
/// ```
pub fn response<const N: usize>(
    status: u16,
    content_type: ContentType,
    body: &[u8],
    server_name: &str,
) -> Result<Vec<u8, N>, BuildError> {
    let reason = reason_phrase(status).ok_or(BuildError::UnsupportedStatus(status))?;

    let mut head: String<N> = String::new();
    write!(
        head,
        "{} {} {}\r\nContent-Length: {}\r\nServer: {}\r\nContent-Type: {}\r\n\r\n",
        HTTP_SERVER_PROTO_VERSION,
        status,
        reason,
        body.len(),
        server_name,
        content_type.as_str(),
    )
    .map_err(|_| BuildError::Capacity)?;

    let mut message = head.into_bytes();
    message
        .extend_from_slice(body)
        .map_err(|_| BuildError::Capacity)?;
    Ok(message)
}
