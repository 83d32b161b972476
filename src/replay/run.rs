use std::rc::Rc;

use crate::channel::ring::{RingChannel, RingProducer};
use crate::command::common::CommonCommands;
use crate::command::outcome::Outcome;
use crate::foundation::core::Word;
use crate::foundation::error::{CmdbufError, CmdbufResult};
use crate::foundation::shared::SharedMemory;
use crate::process::processor::{Processor, ProcessorStats, TickReport};
use crate::process::scheduled::ScheduledProcessor;
use crate::process::scheduler::LocalTaskQueue;
use crate::replay::script::{ReplayScript, ScriptStep};
use crate::replay::trace::{TraceEntry, TraceExecutor};

type Driver = ScheduledProcessor<CommonCommands<TraceExecutor>, Rc<LocalTaskQueue>>;

/// Everything observable after a replay.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ReplayResult {
    /// Every tick, explicit and continuation, in the order they ran.
    pub ticks: Vec<TickReport>,
    /// Domain instructions executed (built-in opcodes are not traced).
    pub trace: Vec<TraceEntry>,
    /// Processor counters.
    pub stats: ProcessorStats,
    /// Continuations posted to the host loop.
    pub continuations_posted: u64,
    /// Final committed read cursor.
    pub get: u32,
    /// Final published write cursor.
    pub put: u32,
    /// Token last published by the consumer.
    pub token: u32,
    /// Latched outcome at the end of the replay.
    pub parse_error: Outcome,
    /// Sticky failure flag at the end of the replay.
    pub error_status: bool,
    /// Steps that were never written because the channel failed first.
    pub steps_dropped: usize,
}

/// Run `script` through a scheduled processor on a local task queue.
///
/// The producer writes step by step. When the ring fills up it publishes what it has and lets the
/// consumer drain before retrying. Once the channel is poisoned, remaining steps are dropped.
#[tracing::instrument(level = "debug", skip(script), fields(steps = script.steps.len()))]
pub fn replay(script: &ReplayScript) -> CmdbufResult<ReplayResult> {
    script.validate()?;
    let (mut producer, consumer) = RingChannel::new(script.channel)?;
    let executor = CommonCommands::new(
        TraceExecutor::new(script.outcomes.clone()).with_failing_bind(script.fail_bind),
    );
    let mut processor = Processor::new(consumer, executor, script.processor)?;
    for words in &script.transfers {
        processor
            .transfers_mut()
            .register(SharedMemory::from_words(words))?;
    }

    let queue = Rc::new(LocalTaskQueue::new());
    let driver: Driver = ScheduledProcessor::new(processor, Rc::clone(&queue));
    let mut ticks = Vec::new();

    let mut steps_dropped = 0;
    for (i, step) in script.steps.iter().enumerate() {
        if !write_step(&mut producer, step, &driver, &queue, &mut ticks)? {
            steps_dropped = script.steps.len() - i;
            tracing::warn!(steps_dropped, "channel failed, remaining steps dropped");
            break;
        }
    }
    producer.flush();
    drain(&driver, &queue, &mut ticks)?;

    let (trace, stats) = driver.with_processor(|p| {
        (p.executor_mut().inner_mut().take_trace(), p.stats())
    })?;
    Ok(ReplayResult {
        ticks,
        trace,
        stats,
        continuations_posted: driver.continuations_posted(),
        get: producer.get_offset(),
        put: producer.put_offset(),
        token: producer.last_token_read(),
        parse_error: producer.parse_error(),
        error_status: producer.error_status(),
        steps_dropped,
    })
}

// Returns `false` when the step could not be written because the channel is poisoned.
fn write_step(
    producer: &mut RingProducer,
    step: &ScriptStep,
    driver: &Driver,
    queue: &LocalTaskQueue,
    ticks: &mut Vec<TickReport>,
) -> CmdbufResult<bool> {
    match try_write(producer, step) {
        Err(CmdbufError::RingFull { .. }) => {}
        other => return other.map(|()| true),
    }
    if producer.error_status() {
        return Ok(false);
    }
    producer.flush();
    drain(driver, queue, ticks)?;
    if producer.error_status() {
        return Ok(false);
    }
    try_write(producer, step)?;
    Ok(true)
}

fn try_write(producer: &mut RingProducer, step: &ScriptStep) -> CmdbufResult<()> {
    match step {
        ScriptStep::Command { opcode, args } => producer.write_command(*opcode, args),
        ScriptStep::Raw { words } => producer.write_raw(words),
        ScriptStep::Token => producer.insert_token().map(|_| ()),
    }
}

// One explicit tick, then continuations until the host loop is idle.
fn drain(driver: &Driver, queue: &LocalTaskQueue, ticks: &mut Vec<TickReport>) -> CmdbufResult<()> {
    ticks.push(driver.process_commands()?);
    while !queue.is_empty() {
        if queue.run_all_pending() > 0 {
            if let Some(report) = driver.last_report() {
                ticks.push(report);
            }
        }
    }
    Ok(())
}

/// Encode `script` and return the words as they would appear in an unwrapped stream.
pub fn dump(script: &ReplayScript) -> CmdbufResult<Vec<Word>> {
    script.validate()?;
    script.encode_words()
}
