//! Read-through cache of synthesized accessors and write primitives.

use crate::{
    accessor::{Accessor, AccessorKey},
    error::Error,
    ir::{Lambda, WritePrimitive},
    model::{FieldRef, MemberId},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub write_primitives: usize,
}

///
/// AccessorCache
///
/// Shared accessor store. Readers never block each other; the write lock
/// is only taken to insert after a miss, and the first inserted entry for
/// a key wins.
///

#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: RwLock<HashMap<AccessorKey, Arc<Accessor>>>,
    primitives: RwLock<HashMap<MemberId, Arc<WritePrimitive>>>,

    // best-effort counters
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AccessorCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached accessor for `key`, building it on a miss.
    pub(crate) fn get_or_build<F>(&self, key: AccessorKey, build: F) -> Result<Arc<Accessor>, Error>
    where
        F: FnOnce(&AccessorKey) -> Result<Lambda, Error>,
    {
        if let Some(hit) = self.read_entries().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key, "accessor cache hit");
            return Ok(Arc::clone(hit));
        }

        let lambda = build(&key)?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, lambda = %lambda, "accessor synthesized");

        let mut entries = self
            .entries
            .write()
            .expect("accessor cache RwLock poisoned while acquiring write lock");
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Accessor::new(key, lambda)));

        Ok(Arc::clone(entry))
    }

    /// The write primitive for a write-once field, created on first use.
    pub(crate) fn write_primitive(&self, field: &FieldRef) -> Arc<WritePrimitive> {
        let id = field.id();
        if let Some(existing) = self
            .primitives
            .read()
            .expect("write primitive RwLock poisoned while acquiring read lock")
            .get(&id)
        {
            return Arc::clone(existing);
        }

        let mut primitives = self
            .primitives
            .write()
            .expect("write primitive RwLock poisoned while acquiring write lock");
        let entry = primitives.entry(id).or_insert_with(|| {
            tracing::debug!(field = ?field, "write primitive synthesized");
            Arc::new(WritePrimitive::new(field.clone()))
        });

        Arc::clone(entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
            write_primitives: self
                .primitives
                .read()
                .expect("write primitive RwLock poisoned while acquiring read lock")
                .len(),
        }
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AccessorKey, Arc<Accessor>>> {
        self.entries
            .read()
            .expect("accessor cache RwLock poisoned while acquiring read lock")
    }
}
