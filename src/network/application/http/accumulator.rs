//! Incremental response buffering.
//!
//! TCP delivers a response in segments of arbitrary size. [`ResponseBuffer`]
//! appends them in arrival order into a fixed-capacity buffer. Once a segment
//! would push the total past the capacity, the buffer discards everything it
//! holds and refuses further data, so a misbehaving server can never make the
//! device use more than `N` bytes or hand a truncated response to the caller.

use heapless::Vec;

/// The response would exceed the buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Growable, capped byte buffer for one in-flight response.
#[derive(Debug)]
pub struct ResponseBuffer<const N: usize> {
    data: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> ResponseBuffer<N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            overflowed: false,
        }
    }

    /// Appends one received chunk after everything accumulated so far.
    ///
    /// # Errors
    ///
    /// [`Overflow`] when the chunk does not fit. The buffer is emptied and
    /// every later call fails as well.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), Overflow> {
        if self.overflowed {
            return Err(Overflow);
        }
        if self.data.len() + chunk.len() > N || self.data.extend_from_slice(chunk).is_err() {
            self.data.clear();
            self.overflowed = true;
            return Err(Overflow);
        }
        Ok(())
    }

    /// Everything accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` once a chunk has been refused.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Maximum number of bytes the buffer accepts.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ResponseBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the status code and body from a raw `HTTP/1.x` response.
///
/// The status is the number after the first space of the status line, `0`
/// when absent or unparsable. The body starts after the first blank line;
/// a response without one has an empty body.
pub fn parse_response(raw: &[u8]) -> (u16, &[u8]) {
    let status = raw
        .split(|&b| b == b'\r' || b == b'\n')
        .next()
        .and_then(|line| {
            let mut parts = line.split(|&b| b == b' ').filter(|part| !part.is_empty());
            let version = parts.next()?;
            if !version.starts_with(b"HTTP/") {
                return None;
            }
            let code = parts.next()?;
            core::str::from_utf8(code).ok()?.parse::<u16>().ok()
        })
        .unwrap_or(0);

    let body = match find_slice(raw, b"\r\n\r\n") {
        Some(pos) => &raw[pos + 4..],
        None => &raw[raw.len()..],
    };

    (status, body)
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
pub(crate) fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
