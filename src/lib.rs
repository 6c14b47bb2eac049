//! # nbhttp - HTTP for callback-driven TCP stacks
//!
//! A small HTTP/1.0 client and server for Wi-Fi microcontrollers whose TCP
//! stack never blocks and reports progress through notifications. The library
//! supports `no_std` environments and never allocates: every buffer has a
//! fixed capacity, and exceeding one is reported as an error.
//!
//! ## Features
//!
//! ### Client
//! - One outbound request at a time, `GET`, `POST` or any other [`Method`]
//! - `http://` and `https://` URLs with optional ports
//! - Asynchronous or immediate hostname resolution
//! - Responses capped at 4096 bytes; the callback runs exactly once
//!
//! ### Server
//! - Request line parsing with `400`/`500` replies for malformed input
//! - Responses framed from a status, a content type and a body
//! - Up to two listening ports per stack
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! nbhttp = "0.1.0"
//! ```
//!
//! Implement [`Transport`] for your TCP stack, wrap it in an [`HttpStack`] and
//! forward every notification of your event loop to [`HttpStack::dispatch`]:
//!
//! ```rust,no_run
//! use nbhttp::network::application::http::{HttpStack, Options};
//! use nbhttp::network::{Event, Handle, Link, Resolution, SocketAddrV4, Transport};
//! use nbhttp::network::error::Error;
//! # struct WifiStack;
//! # impl Transport for WifiStack {
//! #     fn link_up(&self) -> bool { true }
//! #     fn open(&mut self) -> Result<Handle, Error> { Ok(Handle(0)) }
//! #     fn resolve(&mut self, _: Handle, _: &str) -> Result<Resolution, Error> { Ok(Resolution::Pending) }
//! #     fn connect(&mut self, _: Handle, _: SocketAddrV4, _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn send(&mut self, _: Handle, _: &[u8], _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn disconnect(&mut self, _: Handle, _: Link) -> Result<(), Error> { Ok(()) }
//! #     fn close(&mut self, _: Handle) -> Result<(), Error> { Ok(()) }
//! #     fn listen(&mut self, _: u16) -> Result<Handle, Error> { Ok(Handle(1)) }
//! # }
//! # fn next_notification() -> (Handle, Event<'static>) { (Handle(0), Event::Disconnected) }
//! # type Handler = fn(&nbhttp::network::application::http::InboundRequest<'_>)
//! #     -> nbhttp::network::application::http::Response;
//!
//! let mut stack: HttpStack<_, _, Handler> = HttpStack::new(WifiStack, Options::default());
//! stack
//!     .get("http://example.com/api", None, |body: &[u8], status: u16, _raw: &[u8]| {
//!         if status == 200 {
//!             let _ = body;
//!         }
//!     })
//!     .unwrap();
//!
//! while !stack.client_ready() {
//!     let (handle, event) = next_notification();
//!     stack.dispatch(handle, event);
//! }
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, Xtensa)
//! - Host builds, for tests and simulators
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Implement `std::error::Error` for the error types (default: disabled)
//! - `defmt`: Emit log messages through `defmt`
//!
//! [`Method`]: network::application::http::Method
//! [`Transport`]: network::Transport
//! [`HttpStack`]: network::application::http::HttpStack
//! [`HttpStack::dispatch`]: network::application::http::HttpStack::dispatch

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// Must come first so the logging macros are visible in every other module.
mod fmt;

/// Network abstraction layer and the HTTP protocol built on it.
///
/// This module contains the [`Transport`](network::Transport) contract a TCP
/// stack implements, the connection registry, and the HTTP client and server.
pub mod network;
