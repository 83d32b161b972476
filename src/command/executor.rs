use std::sync::atomic::{AtomicU32, Ordering};

use crate::channel::ring::RingConsumer;
use crate::channel::transfer::{TransferEntry, TransferRegistry};
use crate::command::outcome::Outcome;
use crate::foundation::core::Word;
use crate::foundation::error::CmdbufResult;

/// Argument words of one instruction, borrowed straight from the ring.
#[derive(Clone, Copy)]
pub struct ArgWords<'a> {
    cells: &'a [AtomicU32],
}

impl<'a> ArgWords<'a> {
    pub(crate) fn new(cells: &'a [AtomicU32]) -> Self {
        Self { cells }
    }

    /// Argument count (`length - 1`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Return `true` for a zero-argument instruction.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read argument `index`.
    pub fn get(&self, index: usize) -> Option<Word> {
        self.cells.get(index).map(|c| c.load(Ordering::Relaxed))
    }

    /// Iterate over the argument words.
    pub fn iter(&self) -> impl Iterator<Item = Word> + 'a {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed))
    }

    /// Copy the arguments out.
    pub fn to_vec(&self) -> Vec<Word> {
        self.iter().collect()
    }
}

impl std::fmt::Debug for ArgWords<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// What an executor may touch while running an instruction. Neither cursor is reachable from here.
pub struct CommandContext<'a> {
    channel: &'a RingConsumer,
    transfers: &'a TransferRegistry,
    offset: u32,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        channel: &'a RingConsumer,
        transfers: &'a TransferRegistry,
        offset: u32,
    ) -> Self {
        Self {
            channel,
            transfers,
            offset,
        }
    }

    /// Ring offset of the header of the instruction being executed.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Publish a progress token to the producer.
    pub fn set_token(&self, value: u32) {
        self.channel.set_token(value);
    }

    /// Look up a transfer buffer referenced by the instruction.
    pub fn transfer(&self, id: i32) -> CmdbufResult<TransferEntry> {
        self.transfers.lookup(id)
    }
}

/// Interprets decoded instructions for one instruction domain.
///
/// The processor depends only on this trait. Implementations return an [`Outcome`] for every
/// instruction and must not panic on malformed arguments.
pub trait Executor {
    /// Bind whatever environment `execute` needs. Called once per tick before decoding;
    /// returning `false` fails the tick fatally.
    fn make_current(&mut self) -> bool {
        true
    }

    /// Execute one instruction.
    fn execute(&mut self, cx: &CommandContext<'_>, opcode: u32, args: ArgWords<'_>) -> Outcome;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn make_current(&mut self) -> bool {
        (**self).make_current()
    }

    fn execute(&mut self, cx: &CommandContext<'_>, opcode: u32, args: ArgWords<'_>) -> Outcome {
        (**self).execute(cx, opcode, args)
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn make_current(&mut self) -> bool {
        (**self).make_current()
    }

    fn execute(&mut self, cx: &CommandContext<'_>, opcode: u32, args: ArgWords<'_>) -> Outcome {
        (**self).execute(cx, opcode, args)
    }
}
