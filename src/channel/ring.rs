use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::command::common::{NOOP, SET_TOKEN};
use crate::command::outcome::Outcome;
use crate::foundation::core::{CommandHeader, MAX_COMMAND_LENGTH, Word, encode_command};
use crate::foundation::error::{CmdbufError, CmdbufResult};
use crate::foundation::shared::SharedMemory;

/// Ring configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelOpts {
    /// Ring capacity in words.
    pub capacity_words: u32,
}

impl Default for ChannelOpts {
    fn default() -> Self {
        Self {
            capacity_words: 1024,
        }
    }
}

impl ChannelOpts {
    /// Reject capacities that cannot hold a header plus the empty/full sentinel word.
    pub fn validate(&self) -> CmdbufResult<()> {
        if self.capacity_words < 2 || self.capacity_words > MAX_COMMAND_LENGTH {
            return Err(CmdbufError::validation(format!(
                "ring capacity {} outside 2..={MAX_COMMAND_LENGTH}",
                self.capacity_words
            )));
        }
        Ok(())
    }
}

// Control block shared by both ends. `put` is written only through `RingProducer`, `get` only
// through `RingConsumer`.
struct RingShared {
    memory: SharedMemory,
    capacity: u32,
    put: AtomicU32,
    get: AtomicU32,
    token: AtomicU32,
    parse_error: AtomicU32,
    error_status: AtomicBool,
    put_reads: AtomicU64,
}

/// Constructor for a connected producer/consumer pair over one ring.
pub struct RingChannel;

impl RingChannel {
    /// Allocate a zeroed ring and return its two ends.
    ///
    /// Neither end is `Clone`: there is exactly one writer of `put` and one writer of `get`.
    pub fn new(opts: ChannelOpts) -> CmdbufResult<(RingProducer, RingConsumer)> {
        opts.validate()?;
        let shared = Arc::new(RingShared {
            memory: SharedMemory::new(opts.capacity_words as usize),
            capacity: opts.capacity_words,
            put: AtomicU32::new(0),
            get: AtomicU32::new(0),
            token: AtomicU32::new(0),
            parse_error: AtomicU32::new(Outcome::NoError.code()),
            error_status: AtomicBool::new(false),
            put_reads: AtomicU64::new(0),
        });
        let producer = RingProducer {
            shared: Arc::clone(&shared),
            put: 0,
            next_token: 0,
        };
        let consumer = RingConsumer { shared, get: 0 };
        Ok((producer, consumer))
    }
}

// Status shared by both ends.
impl RingShared {
    fn parse_error(&self) -> Outcome {
        Outcome::from_code(self.parse_error.load(Ordering::Acquire))
    }

    fn reset_parse_error(&self) -> Outcome {
        let prev = self
            .parse_error
            .swap(Outcome::NoError.code(), Ordering::AcqRel);
        Outcome::from_code(prev)
    }

    fn error_status(&self) -> bool {
        self.error_status.load(Ordering::Acquire)
    }

    fn raise_error_status(&self) {
        self.error_status.store(true, Ordering::Release);
    }
}

/// Consumer end: reads instruction words up to a `put` snapshot and publishes `get`.
pub struct RingConsumer {
    shared: Arc<RingShared>,
    get: u32,
}

impl RingConsumer {
    /// Ring capacity in words.
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Snapshot the producer's published write cursor.
    pub fn put_offset(&self) -> u32 {
        self.shared.put_reads.fetch_add(1, Ordering::Relaxed);
        self.shared.put.load(Ordering::Acquire)
    }

    /// Number of times [`RingConsumer::put_offset`] has been called.
    pub fn put_reads(&self) -> u64 {
        self.shared.put_reads.load(Ordering::Relaxed)
    }

    /// Last committed read cursor.
    pub fn get_offset(&self) -> u32 {
        self.get
    }

    /// Publish a new read cursor. An offset equal to the capacity wraps to `0`.
    pub fn commit_get(&mut self, offset: u32) -> CmdbufResult<()> {
        if offset > self.shared.capacity {
            return Err(CmdbufError::validation(format!(
                "get offset {offset} beyond ring capacity {}",
                self.shared.capacity
            )));
        }
        let offset = if offset == self.shared.capacity {
            0
        } else {
            offset
        };
        self.get = offset;
        self.shared.get.store(offset, Ordering::Release);
        Ok(())
    }

    /// Read the word at `offset`.
    pub fn word_at(&self, offset: u32) -> CmdbufResult<Word> {
        self.shared.memory.read(offset as usize)
    }

    pub(crate) fn cells(&self, start: u32, len: u32) -> CmdbufResult<&[AtomicU32]> {
        self.shared.memory.cells(start as usize, len as usize)
    }

    /// Publish a progress token for the producer to poll.
    pub fn set_token(&self, value: u32) {
        self.shared.token.store(value, Ordering::Release);
    }

    /// Last published token.
    pub fn token(&self) -> u32 {
        self.shared.token.load(Ordering::Acquire)
    }

    /// Latch an outcome in the parse-error slot.
    pub fn set_parse_error(&self, outcome: Outcome) {
        self.shared
            .parse_error
            .store(outcome.code(), Ordering::Release);
    }

    /// Currently latched outcome.
    pub fn parse_error(&self) -> Outcome {
        self.shared.parse_error()
    }

    /// Return and clear the latched outcome. Does not clear the error status.
    pub fn reset_parse_error(&self) -> Outcome {
        self.shared.reset_parse_error()
    }

    /// Return `true` once a fatal outcome has been raised on this channel.
    pub fn error_status(&self) -> bool {
        self.shared.error_status()
    }

    /// Mark the channel permanently failed.
    pub fn raise_error_status(&self) {
        self.shared.raise_error_status();
    }
}

impl std::fmt::Debug for RingConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingConsumer")
            .field("capacity", &self.shared.capacity)
            .field("get", &self.get)
            .finish()
    }
}

/// Producer end: writes instruction words and publishes `put`.
///
/// Writes land at a local cursor and become visible to the consumer on [`RingProducer::flush`].
pub struct RingProducer {
    shared: Arc<RingShared>,
    put: u32,
    next_token: u32,
}

impl RingProducer {
    /// Ring capacity in words.
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Local (possibly unpublished) write cursor.
    pub fn put_offset(&self) -> u32 {
        self.put
    }

    /// Read cursor last committed by the consumer.
    pub fn get_offset(&self) -> u32 {
        self.shared.get.load(Ordering::Acquire)
    }

    /// Words that can be written without overrunning the consumer.
    ///
    /// One word always stays free so that `get == put` means empty.
    pub fn free_words(&self) -> u32 {
        let cap = self.shared.capacity;
        let get = self.get_offset() % cap;
        let put = self.put % cap;
        (get + cap - put - 1) % cap
    }

    /// Write pre-encoded words at the local cursor, wrapping at the end of the ring.
    pub fn write_raw(&mut self, words: &[Word]) -> CmdbufResult<()> {
        let needed = u32::try_from(words.len())
            .map_err(|_| CmdbufError::validation("raw write larger than the ring"))?;
        let available = self.free_words();
        if needed > available {
            return Err(CmdbufError::RingFull { needed, available });
        }
        let cap = self.shared.capacity;
        let mut put = self.put % cap;
        for &w in words {
            self.shared.memory.write(put as usize, w)?;
            put = (put + 1) % cap;
        }
        self.put = put;
        Ok(())
    }

    /// Encode and write one instruction.
    ///
    /// An instruction never straddles the end of the ring: when the tail is too short it is
    /// filled with a `Noop` first. Fails without writing anything when space is short.
    pub fn write_command(&mut self, opcode: u32, args: &[Word]) -> CmdbufResult<()> {
        let words = encode_command(opcode, args)?;
        let cap = self.shared.capacity;
        let len = words.len() as u32;
        if len >= cap {
            return Err(CmdbufError::validation(format!(
                "command of {len} words can never fit a ring of {cap}"
            )));
        }

        let put = self.put % cap;
        let tail = cap - put;
        let pad = if len > tail { tail } else { 0 };
        let available = self.free_words();
        if len + pad > available {
            return Err(CmdbufError::RingFull {
                needed: len + pad,
                available,
            });
        }

        if pad > 0 {
            let noop = CommandHeader::new(NOOP, pad)?;
            self.shared.memory.write(put as usize, noop.encode())?;
            self.put = 0;
        }
        let start = if pad > 0 { 0 } else { put };
        self.shared.memory.write_range(start as usize, &words)?;
        self.put = (start + len) % cap;
        Ok(())
    }

    /// Write a `SetToken` instruction carrying the next token and return that token.
    pub fn insert_token(&mut self) -> CmdbufResult<u32> {
        let token = (self.next_token + 1) & 0x7fff_ffff;
        self.write_command(SET_TOKEN, &[token])?;
        self.next_token = token;
        Ok(token)
    }

    /// Token most recently published by the consumer.
    pub fn last_token_read(&self) -> u32 {
        self.shared.token.load(Ordering::Acquire)
    }

    /// Publish the local write cursor.
    pub fn flush(&self) {
        self.shared.put.store(self.put, Ordering::Release);
    }

    /// Move the local write cursor and publish it unchanged, without validation.
    ///
    /// Lets a caller present an arbitrary (even malformed) stream to the consumer.
    pub fn set_put(&mut self, offset: u32) {
        self.put = offset;
        self.shared.put.store(offset, Ordering::Release);
    }

    /// Return `true` once the consumer has poisoned the channel.
    pub fn error_status(&self) -> bool {
        self.shared.error_status()
    }

    /// Mark the channel permanently failed from the producer side.
    pub fn raise_error_status(&self) {
        self.shared.raise_error_status();
    }

    /// Currently latched outcome.
    pub fn parse_error(&self) -> Outcome {
        self.shared.parse_error()
    }

    /// Return and clear the latched outcome. Does not clear the error status.
    pub fn reset_parse_error(&self) -> Outcome {
        self.shared.reset_parse_error()
    }
}

impl std::fmt::Debug for RingProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingProducer")
            .field("capacity", &self.shared.capacity)
            .field("put", &self.put)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/ring.rs"]
mod tests;
