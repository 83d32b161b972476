use crate::channel::ring::RingConsumer;
use crate::channel::transfer::{TransferEntry, TransferRegistry};
use crate::command::executor::Executor;
use crate::command::outcome::Outcome;
use crate::command::parser::CommandParser;
use crate::foundation::error::{CmdbufError, CmdbufResult};

/// Processor configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorOpts {
    /// Maximum number of instructions executed per tick, regardless of their size.
    pub commands_per_update: u32,
}

impl Default for ProcessorOpts {
    fn default() -> Self {
        Self {
            commands_per_update: 100,
        }
    }
}

impl ProcessorOpts {
    /// Reject a zero quantum.
    pub fn validate(&self) -> CmdbufResult<()> {
        if self.commands_per_update == 0 {
            return Err(CmdbufError::validation("commands_per_update must be at least 1"));
        }
        Ok(())
    }
}

/// How a tick ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// The channel was already poisoned; nothing was read.
    Poisoned,
    /// Decoding caught up with `put`.
    Drained,
    /// The quantum ran out with instructions left before `put`.
    Pending,
    /// A fatal outcome was raised during this tick.
    Failed(Outcome),
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TickReport {
    /// How the tick ended.
    pub status: TickStatus,
    /// Committed `get` before the tick.
    pub start_get: u32,
    /// Committed `get` after the tick.
    pub committed_get: u32,
    /// The `put` snapshot, when one was taken.
    pub put: Option<u32>,
    /// Instructions that completed during the tick.
    pub executed: u32,
    /// Words consumed by those instructions.
    pub words_consumed: u64,
    /// Most recent recoverable outcome seen during the tick.
    pub last_recoverable: Option<Outcome>,
}

impl TickReport {
    /// Return `true` when another tick should be scheduled.
    pub fn needs_continuation(&self) -> bool {
        self.status == TickStatus::Pending
    }

    fn idle(status: TickStatus, get: u32) -> Self {
        Self {
            status,
            start_get: get,
            committed_get: get,
            put: None,
            executed: 0,
            words_consumed: 0,
            last_recoverable: None,
        }
    }
}

/// Counters accumulated over the processor's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ProcessorStats {
    /// Ticks that ran (poisoned no-op ticks excluded).
    pub ticks: u64,
    /// Instructions completed.
    pub commands_processed: u64,
    /// Every recoverable outcome, including those later overwritten in the latch.
    pub recoverable_errors: u64,
    /// Ticks that ended with the quantum exhausted.
    pub continuations: u64,
}

/// The scheduling core: one tick binds the executor, decodes a bounded batch and commits `get`.
///
/// Once a fatal outcome has been raised the processor is poisoned for the life of the channel.
pub struct Processor<E> {
    channel: RingConsumer,
    executor: E,
    transfers: TransferRegistry,
    opts: ProcessorOpts,
    stats: ProcessorStats,
}

impl<E: Executor> Processor<E> {
    /// Create a processor over the consumer end of a channel.
    pub fn new(channel: RingConsumer, executor: E, opts: ProcessorOpts) -> CmdbufResult<Self> {
        opts.validate()?;
        Ok(Self {
            channel,
            executor,
            transfers: TransferRegistry::new(),
            opts,
            stats: ProcessorStats::default(),
        })
    }

    /// Run one tick.
    ///
    /// Never fails: every problem is recorded on the channel (parse-error latch and error status)
    /// and summarized in the returned report.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn process_commands(&mut self) -> TickReport {
        let start = self.channel.get_offset();
        if self.channel.error_status() {
            tracing::debug!("channel poisoned, tick skipped");
            return TickReport::idle(TickStatus::Poisoned, start);
        }
        self.stats.ticks += 1;

        if !self.executor.make_current() {
            tracing::error!("failed to make execution context current");
            self.fail(Outcome::GenericError);
            return TickReport::idle(TickStatus::Failed(Outcome::GenericError), start);
        }

        let put = self.channel.put_offset();
        let mut parser = CommandParser::new(&self.channel, &self.transfers, start, put);
        let parsed = parser.process_commands(&mut self.executor, self.opts.commands_per_update);

        self.stats.commands_processed += u64::from(parsed.executed);
        self.stats.recoverable_errors += u64::from(parsed.recoverable_count);
        if let Some(outcome) = parsed.last_recoverable {
            self.channel.set_parse_error(outcome);
        }

        let mut report = TickReport {
            status: TickStatus::Drained,
            start_get: start,
            committed_get: start,
            put: Some(put),
            executed: parsed.executed,
            words_consumed: parsed.words_consumed,
            last_recoverable: parsed.last_recoverable,
        };

        if let Some(fatal) = parsed.fatal {
            // Progress made earlier in this tick is discarded with the poisoned channel.
            self.fail(fatal);
            report.status = TickStatus::Failed(fatal);
            return report;
        }

        if let Err(e) = self.channel.commit_get(parsed.offset) {
            tracing::error!(error = %e, "commit of get offset rejected");
            self.fail(Outcome::OutOfBounds);
            report.status = TickStatus::Failed(Outcome::OutOfBounds);
            return report;
        }
        report.committed_get = parsed.offset;

        if parsed.remaining {
            self.stats.continuations += 1;
            report.status = TickStatus::Pending;
        }
        tracing::debug!(
            executed = parsed.executed,
            get = parsed.offset,
            put,
            pending = parsed.remaining,
            "tick done"
        );
        report
    }

    fn fail(&mut self, outcome: Outcome) {
        tracing::error!(%outcome, get = self.channel.get_offset(), "channel poisoned");
        self.channel.set_parse_error(outcome);
        self.channel.raise_error_status();
    }

    /// Publish a progress token to the producer.
    pub fn set_token(&self, value: u32) {
        self.channel.set_token(value);
    }

    /// Look up a transfer buffer by id.
    pub fn lookup_transfer(&self, id: i32) -> CmdbufResult<TransferEntry> {
        self.transfers.lookup(id).inspect_err(|e| {
            tracing::warn!(id, error = %e, "transfer buffer lookup failed");
        })
    }

    /// Borrow the transfer registry.
    pub fn transfers(&self) -> &TransferRegistry {
        &self.transfers
    }

    /// Mutably borrow the transfer registry (registration happens outside the tick).
    pub fn transfers_mut(&mut self) -> &mut TransferRegistry {
        &mut self.transfers
    }

    /// Return `true` once a fatal outcome has been raised.
    pub fn error_status(&self) -> bool {
        self.channel.error_status()
    }

    /// Poison the channel from outside a tick.
    pub fn raise_error_status(&self) {
        self.channel.raise_error_status();
    }

    /// Return and clear the latched outcome. Does not clear the error status.
    pub fn reset_parse_error(&self) -> Outcome {
        self.channel.reset_parse_error()
    }

    /// Borrow the consumer end of the channel.
    pub fn channel(&self) -> &RingConsumer {
        &self.channel
    }

    /// Borrow the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutably borrow the executor.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Configuration.
    pub fn opts(&self) -> ProcessorOpts {
        self.opts
    }

    /// Lifetime counters.
    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/process/processor.rs"]
mod tests;
