use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::core::Word;
use crate::foundation::error::{CmdbufError, CmdbufResult};

/// A region of words visible to both sides of a channel.
///
/// Cloning shares the region. Every access is bounds-checked and goes through an atomic cell, so
/// a producer and a consumer may hold clones on different threads.
#[derive(Clone)]
pub struct SharedMemory {
    words: Arc<[AtomicU32]>,
}

impl SharedMemory {
    /// Allocate a zeroed region of `len_words` words.
    pub fn new(len_words: usize) -> Self {
        Self {
            words: (0..len_words).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Allocate a region initialized from `words`.
    pub fn from_words(words: &[Word]) -> Self {
        Self {
            words: words.iter().map(|&w| AtomicU32::new(w)).collect(),
        }
    }

    /// Region length in words.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Region length in bytes.
    pub fn size_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<Word>()
    }

    /// Return `true` for a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Read the word at `index`.
    pub fn read(&self, index: usize) -> CmdbufResult<Word> {
        self.cell(index).map(|c| c.load(Ordering::Relaxed))
    }

    /// Write the word at `index`.
    pub fn write(&self, index: usize, value: Word) -> CmdbufResult<()> {
        self.cell(index).map(|c| c.store(value, Ordering::Relaxed))
    }

    /// Copy `len` words starting at `start` out of the region.
    pub fn read_range(&self, start: usize, len: usize) -> CmdbufResult<Vec<Word>> {
        Ok(self
            .cells(start, len)?
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect())
    }

    /// Copy `values` into the region starting at `start`.
    pub fn write_range(&self, start: usize, values: &[Word]) -> CmdbufResult<()> {
        for (cell, &v) in self.cells(start, values.len())?.iter().zip(values) {
            cell.store(v, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Borrow `len` cells starting at `start` without copying.
    pub(crate) fn cells(&self, start: usize, len: usize) -> CmdbufResult<&[AtomicU32]> {
        start
            .checked_add(len)
            .and_then(|end| self.words.get(start..end))
            .ok_or_else(|| {
                CmdbufError::validation(format!(
                    "range {start}+{len} outside shared region of {} words",
                    self.words.len()
                ))
            })
    }

    fn cell(&self, index: usize) -> CmdbufResult<&AtomicU32> {
        self.words.get(index).ok_or_else(|| {
            CmdbufError::validation(format!(
                "index {index} outside shared region of {} words",
                self.words.len()
            ))
        })
    }

    /// Return `true` when both handles view the same region.
    pub fn same_region(&self, other: &SharedMemory) -> bool {
        Arc::ptr_eq(&self.words, &other.words)
    }
}

impl std::fmt::Debug for SharedMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemory")
            .field("len_words", &self.words.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/shared.rs"]
mod tests;
