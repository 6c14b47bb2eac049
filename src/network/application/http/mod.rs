//! HTTP/1.0 over callback-driven TCP stacks.
//!
//! This module provides a lightweight HTTP client and server designed for
//! Wi-Fi microcontrollers whose network stack reports progress through
//! notifications instead of blocking calls. It focuses on predictable memory
//! usage: every buffer has a fixed capacity, and exceeding one is an error
//! rather than an allocation.
//!
//! # Features
//!
//! - HTTP/1.0 requests with `Connection: close`
//! - Plain and TLS connections through the same API
//! - Asynchronous hostname resolution
//! - Response size cap ([`MAX_RESPONSE_SIZE`]) to bound RAM use
//! - Minimal server: request line parsing and response framing
//! - Exactly one response callback per accepted request, on every exit path
//!
//! # Usage
//!
//! The main entry point is [`HttpStack`], which owns the transport, the
//! client session and any listening servers. The transport's event loop feeds
//! every notification to [`HttpStack::dispatch`].
//!
//! ```rust,no_run
//! use nbhttp::network::application::http::{HttpStack, InboundRequest, Response, ContentType};
//! use nbhttp::network::{Handle, Link, Resolution, SocketAddrV4, Transport};
//! use nbhttp::network::error::Error;
//! # struct Stack;
//! # impl Transport for Stack {
//! #     fn link_up(&self) -> bool { true }
//! #     fn open(&mut self) -> Result<Handle, Error> { Ok(Handle(0)) }
//! #     fn resolve(&mut self, _: Handle, _: &str) -> Result<Resolution, Error> { Ok(Resolution::Pending) }
//! #     fn connect(&mut self, _: Handle, _: SocketAddrV4, _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn send(&mut self, _: Handle, _: &[u8], _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn disconnect(&mut self, _: Handle, _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn close(&mut self, _: Handle) -> Result<(), Error> { Ok(()) }
//! #     fn listen(&mut self, _: u16) -> Result<Handle, Error> { Ok(Handle(1)) }
//! # }
//!
//! fn on_response(body: &[u8], status: u16, _raw: &[u8]) {
//!     // status == 0 means the request failed
//!     let _ = (body, status);
//! }
//!
//! fn on_request(request: &InboundRequest<'_>) -> Response {
//!     match request.path {
//!         "/status" => Response::new(200, ContentType::ApplicationJson, b"{}"),
//!         _ => Response::empty(404),
//!     }
//! }
//!
//! let mut stack: HttpStack<Stack, fn(&[u8], u16, &[u8]), fn(&InboundRequest<'_>) -> Response> =
//!     HttpStack::new(Stack, Default::default());
//! stack.create_server(80, on_request).unwrap();
//! stack.get("http://example.com/api", None, on_response).unwrap();
//! ```

use core::fmt;

/// Error kinds for client and server entry points.
pub mod error;

/// URL splitting.
pub mod url;

/// Request and response text assembly.
pub mod builder;

/// Incremental response buffering.
pub mod accumulator;

/// Outbound request state machine.
pub mod client;

/// Inbound request handling.
pub mod server;

/// Notification routing between the transport and the sessions.
pub mod stack;

pub use accumulator::ResponseBuffer;
pub use client::{Accepted, ClientSession, Options, ResponseHandler, State};
pub use error::Error;
pub use server::{InboundRequest, RequestHandler, Response, Server, ServerConfig};
pub use stack::HttpStack;
pub use url::Url;

/// Protocol version written on outbound request lines.
pub const HTTP_PROTO_VERSION: &str = "HTTP/1.0";
/// Protocol version written on server status lines.
pub const HTTP_SERVER_PROTO_VERSION: &str = "HTTP/1.1";

/// Port used for `http://` URLs without an explicit port.
pub const HTTP_DEFAULT_PORT: u16 = 80;
/// Port used for `https://` URLs without an explicit port.
pub const HTTPS_DEFAULT_PORT: u16 = 443;

/// Largest response (status line, headers and body) the client will buffer.
pub const MAX_RESPONSE_SIZE: usize = 4096;
/// Largest hostname a request can carry.
pub const MAX_HOSTNAME_LEN: usize = 128;
/// Largest request path, query included.
pub const MAX_PATH_LEN: usize = 256;
/// Largest block of caller-supplied extra headers.
pub const MAX_EXTRA_HEADERS_LEN: usize = 512;
/// Largest outbound request body.
pub const MAX_REQUEST_BODY_LEN: usize = 1024;
/// Capacity of the buffer holding an outbound request line and headers.
pub const REQUEST_HEAD_SIZE: usize = 1024;

/// Largest request method the server accepts.
pub const MAX_SERVER_METHOD_LEN: usize = 8;
/// Largest request path the server accepts.
pub const MAX_SERVER_PATH_LEN: usize = 100;
/// Largest body a server handler can return.
pub const MAX_RESPONSE_BODY_LEN: usize = 2048;
/// Capacity of the buffer holding a framed server response.
pub const SERVER_RESPONSE_SIZE: usize = MAX_RESPONSE_BODY_LEN + 256;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Canonical upper-case name, as written on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Looks up a method by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "PATCH" => Some(Method::Patch),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body types a server handler can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    TextHtml,
    TextPlain,
    TextXml,
    MultipartFormData,
    ApplicationJson,
    ApplicationXml,
}

impl ContentType {
    /// MIME type written in the `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextHtml => "text/html",
            ContentType::TextPlain => "text/plain",
            ContentType::TextXml => "text/xml",
            ContentType::MultipartFormData => "multipart/form-data",
            ContentType::ApplicationJson => "application/json",
            ContentType::ApplicationXml => "application/xml",
        }
    }
}

/// Numeric content type tags, in declaration order. Unknown tags fall back
/// to `text/html`.
impl From<u8> for ContentType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => ContentType::TextPlain,
            2 => ContentType::TextXml,
            3 => ContentType::MultipartFormData,
            4 => ContentType::ApplicationJson,
            5 => ContentType::ApplicationXml,
            _ => ContentType::TextHtml,
        }
    }
}
