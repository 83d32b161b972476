use std::collections::BTreeMap;

use crate::command::executor::{ArgWords, CommandContext, Executor};
use crate::command::outcome::Outcome;
use crate::foundation::core::Word;

/// One instruction seen by a [`TraceExecutor`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TraceEntry {
    /// Ring offset of the instruction header.
    pub offset: u32,
    /// Opcode.
    pub opcode: u32,
    /// Argument words.
    pub args: Vec<Word>,
    /// Outcome returned for the instruction.
    pub outcome: Outcome,
}

/// Executor that records every instruction and answers with scripted outcomes.
///
/// Opcodes absent from the outcome table succeed.
#[derive(Debug, Default)]
pub struct TraceExecutor {
    outcomes: BTreeMap<u32, Outcome>,
    fail_bind: bool,
    binds: u64,
    trace: Vec<TraceEntry>,
}

impl TraceExecutor {
    /// Create an executor with an outcome table.
    pub fn new(outcomes: BTreeMap<u32, Outcome>) -> Self {
        Self {
            outcomes,
            ..Self::default()
        }
    }

    /// Make every subsequent [`Executor::make_current`] call fail.
    pub fn with_failing_bind(mut self, fail: bool) -> Self {
        self.fail_bind = fail;
        self
    }

    /// Instructions executed so far, in order.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Take the recorded trace, leaving it empty.
    pub fn take_trace(&mut self) -> Vec<TraceEntry> {
        std::mem::take(&mut self.trace)
    }

    /// Number of `make_current` calls.
    pub fn binds(&self) -> u64 {
        self.binds
    }
}

impl Executor for TraceExecutor {
    fn make_current(&mut self) -> bool {
        self.binds += 1;
        !self.fail_bind
    }

    fn execute(&mut self, cx: &CommandContext<'_>, opcode: u32, args: ArgWords<'_>) -> Outcome {
        let outcome = self.outcomes.get(&opcode).copied().unwrap_or_default();
        self.trace.push(TraceEntry {
            offset: cx.offset(),
            opcode,
            args: args.to_vec(),
            outcome,
        });
        outcome
    }
}
