//! Minimal HTTP server.
//!
//! The server does not parse headers. For every received segment it reads
//! the request line, locates the start of the body, hands a read-only view
//! to the user's [`RequestHandler`] and frames whatever the handler returns
//! as an HTTP response. Malformed request lines get an error response instead
//! of reaching the handler:
//!
//! | request line                          | reply |
//! |---------------------------------------|-------|
//! | fewer than two spaces                 | 500   |
//! | method or path over the scratch limit | 500   |
//! | version not starting with `HTTP`      | 400   |
//! | empty or non UTF-8 method/path        | 400   |

use super::accumulator::find_slice;
use super::builder::{self, BuildError};
use super::error::Error;
use super::{
    ContentType, MAX_RESPONSE_BODY_LEN, MAX_SERVER_METHOD_LEN, MAX_SERVER_PATH_LEN,
    SERVER_RESPONSE_SIZE,
};
use crate::network::{Handle, Link, Transport};
use core::fmt;
use heapless::Vec;

/// Value of the `Server` header unless configured otherwise.
pub const DEFAULT_SERVER_NAME: &str = "lwIP/1.4.0";

/// Read-only view of one inbound request, valid for a single handler call.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    /// Connection the request arrived on.
    pub handle: Handle,
    /// Request method, e.g. `GET`.
    pub method: &'a str,
    /// Request target, e.g. `/api/v1/thing?x=1`.
    pub path: &'a str,
    /// Offset of the body in `raw`, `None` when no blank line was found.
    pub body_start: Option<usize>,
    /// Bytes after the blank line. Empty when there is none.
    pub body: &'a [u8],
    /// The whole received segment.
    pub raw: &'a [u8],
}

/// What a handler sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: ContentType,
    pub body: Vec<u8, MAX_RESPONSE_BODY_LEN>,
}

impl Response {
    /// A response with `body`.
    ///
    /// A body larger than [`MAX_RESPONSE_BODY_LEN`] cannot be sent whole, so
    /// it is replaced by an empty `500` response. Use [`try_new`](Self::try_new)
    /// to handle that case yourself.
    pub fn new(status: u16, content_type: ContentType, body: &[u8]) -> Self {
        Self::try_new(status, content_type, body).unwrap_or_else(|_| {
            warn!("response body of {} bytes too large", body.len());
            Self::empty(500)
        })
    }

    /// A response with `body`, or [`Error::MemError`] if it does not fit.
    pub fn try_new(status: u16, content_type: ContentType, body: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            status,
            content_type,
            body: Vec::from_slice(body).map_err(|_| Error::MemError)?,
        })
    }

    /// A `text/html` response without body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: ContentType::TextHtml,
            body: Vec::new(),
        }
    }
}

/// Produces a response for each inbound request.
///
/// Implemented for every `FnMut(&InboundRequest<'_>) -> Response`.
pub trait RequestHandler {
    fn handle(&mut self, request: &InboundRequest<'_>) -> Response;
}

impl<F> RequestHandler for F
where
    F: FnMut(&InboundRequest<'_>) -> Response,
{
    fn handle(&mut self, request: &InboundRequest<'_>) -> Response {
        self(request)
    }
}

/// Configuration owned by a listening socket for its whole lifetime.
#[derive(Debug, Clone)]
pub struct ServerConfig<H> {
    /// Port to listen on.
    pub port: u16,
    /// The user's request handler.
    pub handler: H,
    /// Value of the `Server` response header.
    pub server_name: &'static str,
}

impl<H> ServerConfig<H> {
    pub fn new(port: u16, handler: H) -> Self {
        Self {
            port,
            handler,
            server_name: DEFAULT_SERVER_NAME,
        }
    }
}

/// One listening socket and its handler.
pub struct Server<H> {
    listener: Handle,
    config: ServerConfig<H>,
}

impl<H> fmt::Debug for Server<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .field("port", &self.config.port)
            .field("server_name", &self.config.server_name)
            .finish()
    }
}

impl<H: RequestHandler> Server<H> {
    pub fn new(listener: Handle, config: ServerConfig<H>) -> Self {
        Self { listener, config }
    }

    /// The listening socket's handle.
    pub fn listener(&self) -> Handle {
        self.listener
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Handles one received segment on the inbound connection `conn`.
    pub fn on_receive<T: Transport>(&mut self, transport: &mut T, conn: Handle, data: &[u8]) {
        let line_end = data
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(data.len());
        let line = &data[..line_end];

        let Some(first_space) = line.iter().position(|&b| b == b' ') else {
            warn!("request line without method separator on {}", conn);
            return self.reply(transport, conn, 500, ContentType::TextHtml, &[]);
        };
        let Some(second_space) = line[first_space + 1..]
            .iter()
            .position(|&b| b == b' ')
            .map(|pos| first_space + 1 + pos)
        else {
            warn!("request line without version separator on {}", conn);
            return self.reply(transport, conn, 500, ContentType::TextHtml, &[]);
        };
        if !line[second_space + 1..].starts_with(b"HTTP") {
            warn!("request line without HTTP version on {}", conn);
            return self.reply(transport, conn, 400, ContentType::TextHtml, &[]);
        }

        let method = &line[..first_space];
        let path = &line[first_space + 1..second_space];
        if method.len() > MAX_SERVER_METHOD_LEN || path.len() > MAX_SERVER_PATH_LEN {
            warn!("request line too long on {}", conn);
            return self.reply(transport, conn, 500, ContentType::TextHtml, &[]);
        }
        let (Ok(method), Ok(path)) = (core::str::from_utf8(method), core::str::from_utf8(path))
        else {
            return self.reply(transport, conn, 400, ContentType::TextHtml, &[]);
        };
        if method.is_empty() || path.is_empty() {
            return self.reply(transport, conn, 400, ContentType::TextHtml, &[]);
        }

        let body_start = find_slice(data, b"\n\r\n").map(|pos| pos + 3);
        let body = match body_start {
            Some(start) => &data[start..],
            None => &data[data.len()..],
        };

        debug!("{} {} on {}", method, path, conn);
        let request = InboundRequest {
            handle: conn,
            method,
            path,
            body_start,
            body,
            raw: data,
        };
        let response = self.config.handler.handle(&request);
        self.reply(
            transport,
            conn,
            response.status,
            response.content_type,
            &response.body,
        );
    }

    fn reply<T: Transport>(
        &self,
        transport: &mut T,
        conn: Handle,
        status: u16,
        content_type: ContentType,
        body: &[u8],
    ) {
        let message = match builder::response::<SERVER_RESPONSE_SIZE>(
            status,
            content_type,
            body,
            self.config.server_name,
        ) {
            Ok(message) => message,
            Err(BuildError::UnsupportedStatus(code)) => {
                warn!("status {} has no reason phrase, not replying", code);
                return;
            }
            Err(BuildError::Capacity) => {
                warn!("response does not fit in {} bytes", SERVER_RESPONSE_SIZE);
                return;
            }
        };

        if let Err(err) = transport.send(conn, &message, Link::Plain) {
            warn!("sending response on {} failed: {}", conn, err);
        }
    }
}
