//! Error kinds reported by the HTTP client and server entry points.

use crate::network::error::Error as NetworkError;
use core::fmt;

/// Why an HTTP operation was refused.
///
/// Network failures that happen *after* a request was accepted are never
/// returned here; they reach the caller once, through the response handler,
/// as an empty body with status `0`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A request is already in flight on the client connection.
    NotReady,
    /// The URL scheme is neither `http://` nor `https://`.
    ProtocolNotValid,
    /// The host/port split of the URL is invalid.
    MalformedUrl,
    /// The transport rejected the hostname as a lookup argument.
    DnsArgError,
    /// The hostname lookup could not be started.
    DnsError,
    /// The device has no network attachment.
    NoConnection,
    /// A fixed-capacity buffer could not hold the data.
    MemError,
    /// Any other transport failure.
    Transport(NetworkError),
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        Error::Transport(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotReady => f.write_str("client busy with another request"),
            Error::ProtocolNotValid => f.write_str("unsupported URL scheme"),
            Error::MalformedUrl => f.write_str("malformed URL"),
            Error::DnsArgError => f.write_str("invalid hostname for lookup"),
            Error::DnsError => f.write_str("hostname lookup failed"),
            Error::NoConnection => f.write_str("no network connection"),
            Error::MemError => f.write_str("buffer capacity exceeded"),
            Error::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotReady => defmt::write!(f, "NotReady"),
            Error::ProtocolNotValid => defmt::write!(f, "ProtocolNotValid"),
            Error::MalformedUrl => defmt::write!(f, "MalformedUrl"),
            Error::DnsArgError => defmt::write!(f, "DnsArgError"),
            Error::DnsError => defmt::write!(f, "DnsError"),
            Error::NoConnection => defmt::write!(f, "NoConnection"),
            Error::MemError => defmt::write!(f, "MemError"),
            Error::Transport(err) => defmt::write!(f, "Transport({})", err),
        }
    }
}
