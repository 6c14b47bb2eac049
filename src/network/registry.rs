//! Connection registry.
//!
//! A callback-driven stack identifies every notification only by the
//! connection it concerns. The registry is the back-reference from that
//! [`Handle`] to whatever owns the connection (an outbound request, a
//! listening server, an accepted inbound connection...). Each handle has
//! exactly one owner; binding an owned handle again is refused.

use super::Handle;
use super::error::Error;
use heapless::FnvIndexMap;

/// Fixed-capacity map from transport handles to their owner.
///
/// `N` must be a power of two.
#[derive(Debug)]
pub struct Registry<V, const N: usize> {
    entries: FnvIndexMap<Handle, V, N>,
}

impl<V, const N: usize> Registry<V, N> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Records `owner` as the sole owner of `handle`.
    ///
    /// # Errors
    ///
    /// * [`Error::InUse`] - the handle already has an owner
    /// * [`Error::OutOfResources`] - every slot is taken
    pub fn bind(&mut self, handle: Handle, owner: V) -> Result<(), Error> {
        if self.entries.contains_key(&handle) {
            return Err(Error::InUse);
        }
        self.entries
            .insert(handle, owner)
            .map_err(|_| Error::OutOfResources)?;
        Ok(())
    }

    /// Returns the owner of `handle`, if any.
    pub fn owner(&self, handle: Handle) -> Option<&V> {
        self.entries.get(&handle)
    }

    /// Removes and returns the owner of `handle`.
    pub fn release(&mut self, handle: Handle) -> Option<V> {
        self.entries.remove(&handle)
    }

    /// Number of bound handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no handle is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every bound handle and its owner.
    pub fn iter(&self) -> impl Iterator<Item = (&Handle, &V)> {
        self.entries.iter()
    }
}

impl<V, const N: usize> Default for Registry<V, N> {
    fn default() -> Self {
        Self::new()
    }
}
