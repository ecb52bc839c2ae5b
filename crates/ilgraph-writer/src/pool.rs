//! Interning tables and the session-wide handle counter

use crate::error::{ExportError, Result};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Pool handle as written on the wire.
pub type Handle = u16;

/// Append-only table mapping a structural key to the handle it was first
/// defined under. Entries are never evicted.
#[derive(Debug, Clone)]
pub struct IdentityPool<K> {
    handles: HashMap<K, Handle>,
}

impl<K: Eq + Hash> IdentityPool<K> {
    pub fn new() -> Self {
        IdentityPool {
            handles: HashMap::new(),
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.handles.contains_key(key)
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.handles.get(key).copied()
    }

    /// Record `key` under `handle`. The key must be new to the pool.
    pub fn insert(&mut self, key: K, handle: Handle) -> Handle {
        let previous = self.handles.insert(key, handle);
        debug_assert!(previous.is_none(), "pool key defined twice");
        handle
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<K: Eq + Hash> Default for IdentityPool<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues handles 0, 1, 2, ... shared by every pool of a session.
#[derive(Debug, Clone, Default)]
pub struct HandleCounter {
    next: u32,
}

impl HandleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused handle. Fails once all 65536 handles are issued.
    pub fn allocate(&mut self) -> Result<Handle> {
        let handle = Handle::try_from(self.next).map_err(|_| ExportError::PoolExhausted)?;
        self.next += 1;
        Ok(handle)
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
