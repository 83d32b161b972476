use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::error::{CmdbufError, CmdbufResult};
use crate::foundation::shared::SharedMemory;

/// A registered auxiliary region, as returned by [`TransferRegistry::lookup`].
#[derive(Clone, Debug)]
pub struct TransferEntry {
    /// Registry id.
    pub id: i32,
    /// Shared view of the region.
    pub memory: SharedMemory,
    /// Region size in words.
    pub size_words: usize,
}

/// Small-integer ids mapped to bulk-data regions referenced by instructions.
///
/// Ids start at 1 and the smallest released id is handed out first.
#[derive(Debug, Default)]
pub struct TransferRegistry {
    entries: BTreeMap<i32, SharedMemory>,
    free_ids: BTreeSet<i32>,
    next_id: i32,
}

impl TransferRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            free_ids: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Register an existing region and return its id.
    pub fn register(&mut self, memory: SharedMemory) -> CmdbufResult<i32> {
        let id = match self.free_ids.pop_first() {
            Some(id) => id,
            None => {
                let id = self.next_id.max(1);
                self.next_id = id
                    .checked_add(1)
                    .ok_or_else(|| CmdbufError::validation("transfer buffer ids exhausted"))?;
                id
            }
        };
        tracing::debug!(id, size_words = memory.len_words(), "transfer buffer registered");
        self.entries.insert(id, memory);
        Ok(id)
    }

    /// Allocate a zeroed region of `size_words` words and register it.
    pub fn create(&mut self, size_words: usize) -> CmdbufResult<i32> {
        self.register(SharedMemory::new(size_words))
    }

    /// Unregister `id`, making it available for reuse.
    pub fn destroy(&mut self, id: i32) -> CmdbufResult<()> {
        self.entries
            .remove(&id)
            .ok_or(CmdbufError::UnknownTransferBuffer(id))?;
        self.free_ids.insert(id);
        Ok(())
    }

    /// Look up a registered region.
    pub fn lookup(&self, id: i32) -> CmdbufResult<TransferEntry> {
        let memory = self
            .entries
            .get(&id)
            .ok_or(CmdbufError::UnknownTransferBuffer(id))?;
        Ok(TransferEntry {
            id,
            memory: memory.clone(),
            size_words: memory.len_words(),
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/transfer.rs"]
mod tests;
