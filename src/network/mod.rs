//! A network abstraction layer for callback-driven TCP stacks
//!
//! Small network stacks found on Wi-Fi microcontrollers do not offer blocking
//! sockets. Every operation is started with a non-blocking call and finishes
//! later, when the stack's event loop delivers a notification (connected,
//! data received, disconnected...). This module models both halves:
//!
//! - [`Transport`]: the calls the HTTP core makes into the stack.
//! - [`Event`]: the notifications the stack hands back, tagged with the
//!   [`Handle`] of the connection they concern.
//!
//! ```text
//! ┌─────────────────┐   connect/send/...   ┌─────────────────┐
//! │    HTTP core    │ ───────────────────▶ │    Transport    │
//! │   (HttpStack)   │ ◀─────────────────── │   (TCP stack)   │
//! └─────────────────┘   dispatch(Event)    └─────────────────┘
//! ```

#![allow(missing_docs)]
#![deny(unsafe_code)]

pub use core::net::{Ipv4Addr, SocketAddrV4};

/// Common error types for transport operations
pub mod error;

/// Handle-to-owner bookkeeping for transport connections
pub mod registry;

/// Application layer protocols built on top of [`Transport`]
pub mod application;

use error::Error;

/// Opaque reference to one connection or listening socket.
///
/// Handles are minted by the [`Transport`]; the HTTP core never interprets
/// the number, it only uses it as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u16);

#[cfg(feature = "defmt")]
impl defmt::Format for Handle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{}", self.0)
    }
}

/// TLS settings handed to the transport for secure connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsOptions {
    /// Verify the server certificate chain during the handshake.
    ///
    /// Off by default so a device with no CA store can talk to any HTTPS
    /// endpoint. This accepts any peer and is a known weakness; enable it
    /// whenever the transport has trust anchors.
    pub verify_certificates: bool,
    /// Size in bytes of the TLS record buffer the transport should reserve.
    pub buffer_size: u16,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify_certificates: false,
            buffer_size: 5120,
        }
    }
}

/// How bytes travel over a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Plain TCP.
    Plain,
    /// TLS over TCP.
    Secure(TlsOptions),
}

impl Link {
    /// Returns `true` for TLS links.
    pub fn is_secure(&self) -> bool {
        matches!(self, Link::Secure(_))
    }
}

/// Outcome of starting a hostname lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The address is already known (cached name or literal IP).
    Resolved(Ipv4Addr),
    /// The lookup is in flight; an [`Event::Resolved`] will follow.
    Pending,
}

/// A notification delivered by the transport's event loop.
///
/// For a given handle the order is connect, then any interleaving of
/// `Sent` and `Received`, then exactly one terminal `Disconnected` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// An asynchronous hostname lookup finished. `None` means it failed.
    Resolved(Option<Ipv4Addr>),
    /// An outbound connection is established.
    Connected,
    /// A new inbound connection arrived on `listener`. The event's handle is
    /// the new connection.
    Accepted {
        /// The listening socket that accepted the connection.
        listener: Handle,
    },
    /// A previous `send` has been flushed to the peer.
    Sent,
    /// A TCP segment arrived.
    Received(&'a [u8]),
    /// The connection closed. Terminal.
    Disconnected,
    /// The connection failed with a stack specific code. Terminal.
    Error(i8),
}

impl Event<'_> {
    /// Returns `true` for notifications after which the handle is dead.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Disconnected | Event::Error(_))
    }
}

/// The calls the HTTP core makes into a callback-driven TCP stack.
///
/// No method may block. Every method that starts network activity returns as
/// soon as the request is queued; its result is delivered later as an
/// [`Event`] through [`HttpStack::dispatch`](application::http::HttpStack::dispatch).
pub trait Transport {
    /// Whether the device currently has a network attachment (e.g. the Wi-Fi
    /// station holds an IP address).
    fn link_up(&self) -> bool;

    /// Obtain a handle for an outbound connection.
    fn open(&mut self) -> Result<Handle, Error>;

    /// Start resolving `hostname` for the connection `handle`.
    ///
    /// Returns [`Error::InvalidAddress`] when the name is unusable as an
    /// argument; any other error means the lookup could not be started.
    fn resolve(&mut self, handle: Handle, hostname: &str) -> Result<Resolution, Error>;

    /// Start connecting `handle` to `remote`.
    fn connect(&mut self, handle: Handle, remote: SocketAddrV4, link: Link) -> Result<(), Error>;

    /// Queue `data` for transmission. The transport must copy or fully consume
    /// the bytes before returning.
    fn send(&mut self, handle: Handle, data: &[u8], link: Link) -> Result<(), Error>;

    /// Start a graceful close. A terminal event follows.
    fn disconnect(&mut self, handle: Handle, link: Link) -> Result<(), Error>;

    /// Abort the connection and free every transport resource tied to it.
    fn close(&mut self, handle: Handle) -> Result<(), Error>;

    /// Start accepting connections on `port`.
    fn listen(&mut self, port: u16) -> Result<Handle, Error>;
}
