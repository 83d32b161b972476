//! cmdbuf is an asynchronous command-buffer processor.
//!
//! A producer writes variable-length instructions into a shared ring of 32-bit words and publishes
//! a `put` cursor. A consumer-side [`Processor`] snapshots `put`, decodes a bounded batch through
//! a pluggable [`Executor`], publishes `get`, and reports recoverable and fatal outcomes through
//! the channel's shared status slots:
//!
//! - Create a connected pair with [`RingChannel::new`]
//! - Wrap a domain executor in [`CommonCommands`] and hand it to a [`Processor`]
//! - Drive ticks directly, or attach a host loop with [`ScheduledProcessor`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Ring channel and transfer registry.
pub mod channel;
/// Instruction decoding and the executor seam.
pub mod command;
/// Tick processing and continuation scheduling.
pub mod process;
/// Scripted replay of producer sessions.
pub mod replay;

pub use crate::foundation::core::{
    CommandHeader, LENGTH_BITS, MAX_COMMAND_LENGTH, MAX_OPCODE, Word, encode_command,
};
pub use crate::foundation::error::{CmdbufError, CmdbufResult};
pub use crate::foundation::shared::SharedMemory;

pub use crate::channel::ring::{ChannelOpts, RingChannel, RingConsumer, RingProducer};
pub use crate::channel::transfer::{TransferEntry, TransferRegistry};
pub use crate::command::common::{COMMON_COMMAND_COUNT, CommonCommands, NOOP, SET_TOKEN};
pub use crate::command::executor::{ArgWords, CommandContext, Executor};
pub use crate::command::outcome::Outcome;
pub use crate::command::parser::{CommandParser, ParseReport};
pub use crate::process::processor::{
    Processor, ProcessorOpts, ProcessorStats, TickReport, TickStatus,
};
pub use crate::process::scheduled::ScheduledProcessor;
pub use crate::process::scheduler::{HostScheduler, LocalTaskQueue, Task, TaskHandle};
pub use crate::replay::run::{ReplayResult, dump, replay};
pub use crate::replay::script::{ReplayScript, ScriptStep};
pub use crate::replay::trace::{TraceEntry, TraceExecutor};
