use crate::channel::ring::RingConsumer;
use crate::channel::transfer::TransferRegistry;
use crate::command::executor::{ArgWords, CommandContext, Executor};
use crate::command::outcome::Outcome;
use crate::foundation::core::CommandHeader;

/// Summary of one bounded parse run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Instructions that completed (successfully or with a recoverable outcome).
    pub executed: u32,
    /// Words those instructions occupied, headers included.
    pub words_consumed: u64,
    /// Offset reached. On a fatal outcome this is the offset of the failing instruction.
    pub offset: u32,
    /// The fatal outcome that stopped decoding, if any.
    pub fatal: Option<Outcome>,
    /// Most recent recoverable outcome, if any.
    pub last_recoverable: Option<Outcome>,
    /// How many recoverable outcomes occurred.
    pub recoverable_count: u32,
    /// `true` when instructions remain between `offset` and `put`.
    pub remaining: bool,
}

/// Decodes instructions between a read cursor and a `put` snapshot.
///
/// The parser never reads at or beyond `put`, so the producer may keep writing while it runs.
pub struct CommandParser<'a> {
    channel: &'a RingConsumer,
    transfers: &'a TransferRegistry,
    get: u32,
    put: u32,
}

impl<'a> CommandParser<'a> {
    /// Start decoding at `get`, stopping at `put`.
    pub fn new(
        channel: &'a RingConsumer,
        transfers: &'a TransferRegistry,
        get: u32,
        put: u32,
    ) -> Self {
        Self {
            channel,
            transfers,
            get,
            put,
        }
    }

    /// Current read offset.
    pub fn get(&self) -> u32 {
        self.get
    }

    /// The `put` snapshot this parser stops at.
    pub fn put(&self) -> u32 {
        self.put
    }

    /// Return `true` when the read offset has caught up with `put`.
    pub fn is_empty(&self) -> bool {
        self.get == self.put
    }

    /// Decode and execute the instruction at the read offset.
    ///
    /// Advances past the instruction unless the outcome is fatal. Returns
    /// [`Outcome::NoError`] without calling the executor when the parser is empty.
    pub fn process_command<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Outcome {
        if self.is_empty() {
            return Outcome::NoError;
        }
        let cap = self.channel.capacity();
        let get = self.get;
        if get >= cap || self.put >= cap {
            return Outcome::OutOfBounds;
        }

        let Ok(word) = self.channel.word_at(get) else {
            return Outcome::OutOfBounds;
        };
        let header = CommandHeader::decode(word);
        if header.length == 0 {
            return Outcome::InvalidSize;
        }

        // Instructions are contiguous: past a wrapped `put` only the tail of the ring is readable.
        let window = if self.put >= get {
            self.put - get
        } else {
            cap - get
        };
        if header.length > window {
            return Outcome::OutOfBounds;
        }
        let Ok(cells) = self.channel.cells(get + 1, header.arg_count()) else {
            return Outcome::OutOfBounds;
        };

        let cx = CommandContext::new(self.channel, self.transfers, get);
        let outcome = executor.execute(&cx, header.opcode, ArgWords::new(cells));
        if outcome.is_fatal() {
            return outcome;
        }
        if outcome.is_error() {
            tracing::warn!(
                opcode = header.opcode,
                offset = get,
                %outcome,
                "recoverable command error"
            );
        }

        let next = get + header.length;
        self.get = if next == cap { 0 } else { next };
        outcome
    }

    /// Run up to `max_commands` instructions, stopping early at `put` or on a fatal outcome.
    pub fn process_commands<E: Executor + ?Sized>(
        &mut self,
        executor: &mut E,
        max_commands: u32,
    ) -> ParseReport {
        let mut report = ParseReport::default();
        while report.executed < max_commands && !self.is_empty() {
            let before = self.get;
            let outcome = self.process_command(executor);
            if outcome.is_fatal() {
                tracing::error!(offset = before, %outcome, "fatal command error");
                report.fatal = Some(outcome);
                break;
            }
            if outcome.is_error() {
                report.last_recoverable = Some(outcome);
                report.recoverable_count += 1;
            }
            report.executed += 1;
            report.words_consumed += u64::from(self.words_between(before, self.get));
        }
        report.offset = self.get;
        report.remaining = !self.is_empty();
        report
    }

    fn words_between(&self, from: u32, to: u32) -> u32 {
        if to > from {
            to - from
        } else {
            self.channel.capacity() - from + to
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/parser.rs"]
mod tests;
