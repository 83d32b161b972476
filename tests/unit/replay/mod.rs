use crate::command::outcome::Outcome;
use crate::foundation::error::CmdbufError;
use crate::process::processor::TickStatus;

use super::run::{dump, replay};
use super::script::{ReplayScript, ScriptStep};

fn commands(opcodes: &[u32]) -> Vec<ScriptStep> {
    opcodes
        .iter()
        .map(|&opcode| ScriptStep::Command {
            opcode,
            args: vec![],
        })
        .collect()
}

#[test]
fn script_json_uses_defaults() {
    let script = ReplayScript::from_json(
        r#"{
            "steps": [
                { "command": { "opcode": 10, "args": [1, 2] } },
                { "raw": { "words": [7] } },
                "token"
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(script.channel.capacity_words, 1024);
    assert_eq!(script.processor.commands_per_update, 100);
    assert!(!script.fail_bind);
    assert_eq!(script.steps.len(), 3);
    assert_eq!(script.steps[2], ScriptStep::Token);
}

#[test]
fn script_rejects_unknown_fields_and_bad_config() {
    let err = ReplayScript::from_json(r#"{ "quantum": 3 }"#).unwrap_err();
    assert!(matches!(err, CmdbufError::Serde(_)));

    let err = ReplayScript::from_json(r#"{ "processor": { "commands_per_update": 0 } }"#)
        .unwrap_err();
    assert!(matches!(err, CmdbufError::Validation(_)));
}

#[test]
fn missing_script_file_is_a_validation_error() {
    let err = ReplayScript::from_path("target/does-not-exist/script.json").unwrap_err();
    assert!(matches!(err, CmdbufError::Validation(_)));
}

#[test]
fn encode_words_numbers_tokens_from_one() {
    let script = ReplayScript {
        steps: vec![
            ScriptStep::Token,
            ScriptStep::Command {
                opcode: 3,
                args: vec![9],
            },
            ScriptStep::Raw { words: vec![42] },
            ScriptStep::Token,
        ],
        ..ReplayScript::default()
    };
    assert_eq!(
        dump(&script).unwrap(),
        vec![(1 << 21) | 2, 1, (3 << 21) | 2, 9, 42, (1 << 21) | 2, 2]
    );
}

#[test]
fn quantum_splits_the_replay_into_continuations() {
    let mut script = ReplayScript {
        steps: commands(&[10, 11, 12, 13, 14]),
        ..ReplayScript::default()
    };
    script.processor.commands_per_update = 2;

    let result = replay(&script).unwrap();
    let statuses: Vec<_> = result.ticks.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TickStatus::Pending, TickStatus::Pending, TickStatus::Drained]
    );
    assert_eq!(result.continuations_posted, 2);
    assert_eq!(result.stats.continuations, 2);
    assert_eq!(result.stats.commands_processed, 5);
    let traced: Vec<_> = result.trace.iter().map(|e| (e.offset, e.opcode)).collect();
    assert_eq!(traced, vec![(0, 10), (1, 11), (2, 12), (3, 13), (4, 14)]);
    assert_eq!(result.get, 5);
    assert_eq!(result.put, 5);
    assert!(!result.error_status);
}

#[test]
fn full_ring_drains_before_the_producer_continues() {
    let mut script = ReplayScript {
        steps: (0..10)
            .map(|_| ScriptStep::Command {
                opcode: 7,
                args: vec![1],
            })
            .collect(),
        ..ReplayScript::default()
    };
    script.channel.capacity_words = 8;

    let result = replay(&script).unwrap();
    assert_eq!(result.trace.len(), 10);
    assert!(result.trace.iter().all(|e| e.opcode == 7 && e.args == [1]));
    assert!(result.ticks.len() > 1);
    assert_eq!(result.get, result.put);
    assert_eq!(result.parse_error, Outcome::NoError);
    assert!(!result.error_status);
}

#[test]
fn tokens_are_published_and_not_traced() {
    let script = ReplayScript {
        steps: vec![
            ScriptStep::Token,
            ScriptStep::Command {
                opcode: 10,
                args: vec![],
            },
            ScriptStep::Token,
        ],
        ..ReplayScript::default()
    };
    let result = replay(&script).unwrap();
    assert_eq!(result.token, 2);
    assert_eq!(result.trace.len(), 1);
    assert_eq!(result.trace[0].opcode, 10);
    assert_eq!(result.trace[0].offset, 2);
}

#[test]
fn scripted_recoverable_outcome_is_latched() {
    let mut script = ReplayScript {
        steps: commands(&[10, 12, 13]),
        ..ReplayScript::default()
    };
    script.outcomes.insert(12, Outcome::UnknownCommand);

    let result = replay(&script).unwrap();
    assert_eq!(result.trace.len(), 3);
    assert_eq!(result.trace[1].outcome, Outcome::UnknownCommand);
    assert_eq!(result.parse_error, Outcome::UnknownCommand);
    assert_eq!(result.stats.recoverable_errors, 1);
    assert!(!result.error_status);
    assert_eq!(result.get, 3);
}

#[test]
fn malformed_header_poisons_without_commit() {
    let script = ReplayScript {
        steps: vec![
            ScriptStep::Command {
                opcode: 10,
                args: vec![],
            },
            ScriptStep::Raw {
                words: vec![5 << 21],
            },
            ScriptStep::Command {
                opcode: 11,
                args: vec![],
            },
        ],
        ..ReplayScript::default()
    };
    let result = replay(&script).unwrap();
    assert_eq!(result.ticks.len(), 1);
    assert_eq!(
        result.ticks[0].status,
        TickStatus::Failed(Outcome::InvalidSize)
    );
    assert_eq!(result.trace.len(), 1);
    assert_eq!(result.get, 0);
    assert_eq!(result.put, 3);
    assert_eq!(result.parse_error, Outcome::InvalidSize);
    assert!(result.error_status);
    assert_eq!(result.steps_dropped, 0);
}

#[test]
fn steps_after_a_failure_are_dropped_once_the_ring_fills() {
    let mut steps = vec![ScriptStep::Raw {
        words: vec![5 << 21],
    }];
    steps.extend(commands(&[10, 10, 10, 10, 10]));
    let mut script = ReplayScript {
        steps,
        ..ReplayScript::default()
    };
    script.channel.capacity_words = 4;

    let result = replay(&script).unwrap();
    assert_eq!(result.steps_dropped, 3);
    let statuses: Vec<_> = result.ticks.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TickStatus::Failed(Outcome::InvalidSize), TickStatus::Poisoned]
    );
    assert!(result.trace.is_empty());
    assert_eq!(result.stats.ticks, 1);
}

#[test]
fn failing_bind_is_a_generic_error() {
    let script = ReplayScript {
        fail_bind: true,
        steps: commands(&[10]),
        ..ReplayScript::default()
    };
    let result = replay(&script).unwrap();
    assert_eq!(
        result.ticks[0].status,
        TickStatus::Failed(Outcome::GenericError)
    );
    assert!(result.trace.is_empty());
    assert_eq!(result.parse_error, Outcome::GenericError);
    assert!(result.error_status);
}

#[test]
fn transfers_are_registered_before_replay() {
    let script = ReplayScript {
        transfers: vec![vec![1, 2, 3], vec![]],
        steps: commands(&[10]),
        ..ReplayScript::default()
    };
    let result = replay(&script).unwrap();
    assert_eq!(result.trace.len(), 1);
}

#[test]
fn trace_executor_counts_binds_and_honours_failing_bind() {
    use crate::command::executor::Executor;
    use super::trace::TraceExecutor;

    let mut exec = TraceExecutor::default();
    assert!(exec.make_current());
    assert!(exec.make_current());
    assert_eq!(exec.binds(), 2);

    let mut failing = TraceExecutor::default().with_failing_bind(true);
    assert!(!failing.make_current());
    assert_eq!(failing.binds(), 1);
    assert!(failing.trace().is_empty());
}
