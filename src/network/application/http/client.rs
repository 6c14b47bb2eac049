//! Outbound HTTP/1.0 requests over a callback-driven transport.
//!
//! A [`ClientSession`] drives exactly one request at a time through
//!
//! ```text
//! Idle → ResolvingDns → Connecting → Sending → AwaitingResponse → (Disconnecting) → Idle
//! ```
//!
//! Nothing blocks. [`ClientSession::request`] validates the input, copies it
//! into the session and starts the hostname lookup; every later step happens
//! inside [`ClientSession::handle_event`] when the transport reports progress.
//!
//! # Completion
//!
//! The response has no explicit end marker: the request asks for
//! `Connection: close` and the response is complete when the transport
//! reports the connection gone. That terminal notification, whether it
//! signals success or failure, is the only path back to `Idle`. On that path
//! the session calls the [`ResponseHandler`] exactly once and then releases
//! the request and its transport handle.
//!
//! A request that never got a response (lookup failure, refused connection,
//! response larger than [`MAX_RESPONSE_SIZE`]) is reported with an empty body
//! and status `0`.

use super::accumulator::{ResponseBuffer, parse_response};
use super::builder::RequestHead;
use super::error::Error;
use super::url::{self, Url};
use super::{
    MAX_EXTRA_HEADERS_LEN, MAX_HOSTNAME_LEN, MAX_REQUEST_BODY_LEN, MAX_RESPONSE_SIZE, Method,
    REQUEST_HEAD_SIZE,
};
use crate::network::error::Error as NetworkError;
use crate::network::{Event, Handle, Ipv4Addr, Link, Resolution, SocketAddrV4, TlsOptions, Transport};
use core::fmt;
use heapless::{String, Vec};

/// Receives the outcome of one request.
///
/// Implemented for every `FnOnce(&[u8], u16, &[u8])`, so plain functions and
/// closures can be used directly.
pub trait ResponseHandler {
    /// Called exactly once per accepted request with the response body, the
    /// status code and the raw response. A failed request has status `0` and
    /// empty slices.
    fn on_response(self, body: &[u8], status: u16, raw: &[u8]);
}

impl<F> ResponseHandler for F
where
    F: FnOnce(&[u8], u16, &[u8]),
{
    fn on_response(self, body: &[u8], status: u16, raw: &[u8]) {
        self(body, status, raw)
    }
}

/// Client configuration.
///
/// # Examples
///
/// ```rust
/// use nbhttp::network::application::http::Options;
/// use nbhttp::network::TlsOptions;
///
/// // The transport has a CA store, so insist on a valid certificate.
/// let options = Options {
///     user_agent: "weather-station/1.2",
///     tls: TlsOptions {
///         verify_certificates: true,
///         ..TlsOptions::default()
///     },
/// };
/// assert_eq!(options.tls.buffer_size, 5120);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Value of the `User-Agent` header.
    pub user_agent: &'static str,
    /// Settings used for `https://` URLs.
    pub tls: TlsOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            user_agent: "nbhttp",
            tls: TlsOptions::default(),
        }
    }
}

/// Where the in-flight request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No request in flight. The only state that accepts a new request.
    Idle,
    /// Waiting for the hostname lookup.
    ResolvingDns,
    /// Waiting for the transport to connect.
    Connecting,
    /// Writing the request head and body.
    Sending,
    /// Collecting response segments until the peer closes.
    AwaitingResponse,
    /// Teardown was requested; waiting for the terminal notification.
    Disconnecting,
}

#[cfg(feature = "defmt")]
impl defmt::Format for State {
    fn format(&self, f: defmt::Formatter) {
        match self {
            State::Idle => defmt::write!(f, "Idle"),
            State::ResolvingDns => defmt::write!(f, "ResolvingDns"),
            State::Connecting => defmt::write!(f, "Connecting"),
            State::Sending => defmt::write!(f, "Sending"),
            State::AwaitingResponse => defmt::write!(f, "AwaitingResponse"),
            State::Disconnecting => defmt::write!(f, "Disconnecting"),
        }
    }
}

/// How far an accepted request got before [`ClientSession::request`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// The hostname lookup is in flight.
    Resolving,
    /// The address was known immediately and the connection is being made.
    Connecting,
}

/// Everything one request owns. Dropped exactly once, when the session
/// finishes or rejects the request.
struct OutboundRequest<H> {
    handle: Handle,
    host: String<MAX_HOSTNAME_LEN>,
    port: u16,
    link: Link,
    /// Request line and headers, released once written.
    head: Option<Vec<u8, REQUEST_HEAD_SIZE>>,
    /// Request body, released once written.
    body: Option<Vec<u8, MAX_REQUEST_BODY_LEN>>,
    response: ResponseBuffer<MAX_RESPONSE_SIZE>,
    handler: H,
}

impl<H> OutboundRequest<H> {
    fn new(
        url: &Url<'_>,
        method: Method,
        body: Option<&[u8]>,
        headers: Option<&str>,
        options: &Options,
        handler: H,
    ) -> Result<Self, Error> {
        let headers = headers.unwrap_or("");
        if headers.len() > MAX_EXTRA_HEADERS_LEN {
            return Err(Error::MemError);
        }

        let head = RequestHead {
            method,
            path: url.path,
            host: url.host,
            port: url.port,
            user_agent: options.user_agent,
            extra_headers: headers,
            content_length: body.map(<[u8]>::len),
        }
        .encode()?;

        let body = match body {
            Some(body) => Some(Vec::from_slice(body).map_err(|_| Error::MemError)?),
            None => None,
        };

        let link = if url.secure {
            Link::Secure(options.tls)
        } else {
            Link::Plain
        };

        Ok(Self {
            handle: Handle(0),
            host: String::try_from(url.host).map_err(|_| Error::MemError)?,
            port: url.port,
            link,
            head: Some(head),
            body,
            response: ResponseBuffer::new(),
            handler,
        })
    }
}

/// The single outbound connection and the request it carries.
pub struct ClientSession<H> {
    options: Options,
    state: State,
    request: Option<OutboundRequest<H>>,
}

impl<H> fmt::Debug for ClientSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("handle", &self.handle())
            .finish()
    }
}

impl<H> ClientSession<H> {
    /// Creates an idle session.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            state: State::Idle,
            request: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Returns `true` when a new request would be accepted.
    pub fn is_ready(&self) -> bool {
        self.state == State::Idle
    }

    /// The transport handle of the in-flight request.
    pub fn handle(&self) -> Option<Handle> {
        self.request.as_ref().map(|request| request.handle)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl<H: ResponseHandler> ClientSession<H> {

    /// Starts an HTTP request.
    ///
    /// On success the request is in flight and `handler` will be called
    /// exactly once, from inside a later [`handle_event`](Self::handle_event)
    /// call. On error nothing is in flight and `handler` is dropped uncalled.
    ///
    /// # Errors
    ///
    /// * [`Error::NotReady`] - another request is in flight
    /// * [`Error::ProtocolNotValid`] / [`Error::MalformedUrl`] - see [`url::parse`]
    /// * [`Error::MemError`] - host, headers, body or request head exceed their capacity
    /// * [`Error::NoConnection`] - the transport has no network attachment
    /// * [`Error::DnsArgError`] / [`Error::DnsError`] - the lookup could not be started
    /// * [`Error::Transport`] - no handle available, or an immediate connect failed
    pub fn request<T: Transport>(
        &mut self,
        transport: &mut T,
        url: &str,
        body: Option<&[u8]>,
        headers: Option<&str>,
        method: Method,
        handler: H,
    ) -> Result<Accepted, Error> {
        if !self.is_ready() {
            return Err(Error::NotReady);
        }

        let url = url::parse(url)?;
        let mut request = OutboundRequest::new(&url, method, body, headers, &self.options, handler)?;

        if !transport.link_up() {
            return Err(Error::NoConnection);
        }

        request.handle = transport.open()?;
        let handle = request.handle;
        debug!(
            "{} {}:{}{} on {}",
            method.as_str(),
            url.host,
            url.port,
            url.path,
            handle
        );

        let resolution = match transport.resolve(handle, url.host) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!("lookup of {} not started: {}", url.host, err);
                close(transport, handle);
                return Err(match err {
                    NetworkError::InvalidAddress => Error::DnsArgError,
                    _ => Error::DnsError,
                });
            }
        };

        self.request = Some(request);
        match resolution {
            Resolution::Pending => {
                self.state = State::ResolvingDns;
                Ok(Accepted::Resolving)
            }
            Resolution::Resolved(ip) => match self.connect(transport, ip) {
                Ok(()) => Ok(Accepted::Connecting),
                Err(err) => {
                    self.request = None;
                    self.state = State::Idle;
                    close(transport, handle);
                    Err(Error::Transport(err))
                }
            },
        }
    }

    /// Shorthand for a `GET` without body.
    pub fn get<T: Transport>(
        &mut self,
        transport: &mut T,
        url: &str,
        headers: Option<&str>,
        handler: H,
    ) -> Result<Accepted, Error> {
        self.request(transport, url, None, headers, Method::Get, handler)
    }

    /// Shorthand for a `POST` with `body`.
    pub fn post<T: Transport>(
        &mut self,
        transport: &mut T,
        url: &str,
        body: &[u8],
        headers: Option<&str>,
        handler: H,
    ) -> Result<Accepted, Error> {
        self.request(transport, url, Some(body), headers, Method::Post, handler)
    }

    /// Advances the state machine with a notification for the client handle.
    pub fn handle_event<T: Transport>(&mut self, transport: &mut T, event: Event<'_>) {
        match (self.state, event) {
            (State::Idle, _) => trace!("stale notification while idle"),
            (_, Event::Disconnected) => self.finish(transport),
            (_, Event::Error(code)) => {
                warn!("connection error {}", code);
                self.finish(transport);
            }
            (State::ResolvingDns, Event::Resolved(None)) => {
                warn!("hostname lookup failed");
                self.finish(transport);
            }
            (State::ResolvingDns, Event::Resolved(Some(ip))) => {
                if let Err(err) = self.connect(transport, ip) {
                    warn!("connect failed: {}", err);
                    self.finish(transport);
                }
            }
            (State::Connecting, Event::Connected) => self.send_request(transport),
            (State::Connecting | State::Sending | State::AwaitingResponse, Event::Received(chunk)) => {
                self.accumulate(transport, chunk)
            }
            (State::Disconnecting, Event::Received(chunk)) => {
                trace!("dropping {} bytes after teardown", chunk.len())
            }
            (_, Event::Sent) => trace!("request data flushed"),
            (state, _) => trace!("ignoring notification in {}", state),
        }
    }

    /// Forcibly aborts the in-flight request, if any, without calling its
    /// handler. Returns the handle that was released.
    pub fn reset<T: Transport>(&mut self, transport: &mut T) -> Option<Handle> {
        self.state = State::Idle;
        let request = self.request.take()?;
        info!("aborting request on {}", request.handle);
        close(transport, request.handle);
        Some(request.handle)
    }

    fn connect<T: Transport>(&mut self, transport: &mut T, ip: Ipv4Addr) -> Result<(), NetworkError> {
        let request = self.request.as_ref().ok_or(NetworkError::NotOpen)?;
        if let Link::Secure(tls) = request.link {
            if !tls.verify_certificates {
                warn!("certificate verification disabled for {}", request.host.as_str());
            }
        }
        transport.connect(request.handle, SocketAddrV4::new(ip, request.port), request.link)?;
        self.state = State::Connecting;
        Ok(())
    }

    fn send_request<T: Transport>(&mut self, transport: &mut T) {
        self.state = State::Sending;
        let Some(request) = self.request.as_mut() else {
            return;
        };

        let mut sent = Ok(());
        if let Some(head) = request.head.take() {
            sent = transport.send(request.handle, &head, request.link);
        }
        if sent.is_ok() {
            if let Some(body) = request.body.take() {
                sent = transport.send(request.handle, &body, request.link);
            }
        }

        match sent {
            Ok(()) => self.state = State::AwaitingResponse,
            Err(err) => {
                warn!("send failed: {}", err);
                self.finish(transport);
            }
        }
    }

    fn accumulate<T: Transport>(&mut self, transport: &mut T, chunk: &[u8]) {
        let Some(request) = self.request.as_mut() else {
            return;
        };
        if request.response.append(chunk).is_ok() {
            return;
        }

        warn!("response exceeds {} bytes, closing", MAX_RESPONSE_SIZE);
        self.state = State::Disconnecting;
        if transport.disconnect(request.handle, request.link).is_err() {
            self.finish(transport);
        }
    }

    /// Terminal path: report once, then release the request and its handle.
    fn finish<T: Transport>(&mut self, transport: &mut T) {
        let Some(request) = self.request.take() else {
            self.state = State::Idle;
            return;
        };
        let OutboundRequest {
            handle,
            response,
            handler,
            ..
        } = request;

        let raw = response.as_bytes();
        let (status, body) = if raw.is_empty() {
            (0, raw)
        } else {
            parse_response(raw)
        };
        debug!("request on {} finished with status {}", handle, status);
        handler.on_response(body, status, raw);

        close(transport, handle);
        self.state = State::Idle;
    }
}

fn close<T: Transport>(transport: &mut T, handle: Handle) {
    if let Err(err) = transport.close(handle) {
        warn!("closing {} failed: {}", handle, err);
    }
}
