//! # Application Layer Network Protocols
//!
//! Application layer (OSI Layer 7) protocols that run over a callback-driven
//! [`Transport`](crate::network::Transport).
//!
//! ## Available Protocols
//!
//! - **[`http`]**: HTTP/1.0 client and minimal HTTP server
//!
//! ## Design Principles
//!
//! - **Transport Agnostic**: Work with any type implementing [`Transport`](crate::network::Transport)
//! - **No-std Compatible**: Fixed-capacity buffers, no heap allocation
//! - **Event Driven**: Progress is made only when a notification is dispatched
//! - **Bounded Memory**: Worst-case RAM use does not depend on the peer

/// HTTP client and server implementation.
///
/// Provides an HTTP/1.0 client with a single in-flight request, and a
/// minimal server that parses request lines and frames responses.
pub mod http;
