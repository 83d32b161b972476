use super::*;
use crate::channel::ring::{ChannelOpts, RingChannel};
use crate::channel::transfer::TransferRegistry;
use crate::command::parser::CommandParser;

#[derive(Default)]
struct Domain {
    seen: Vec<u32>,
    bound: u32,
}

impl Executor for Domain {
    fn make_current(&mut self) -> bool {
        self.bound += 1;
        true
    }

    fn execute(&mut self, _cx: &CommandContext<'_>, opcode: u32, _args: ArgWords<'_>) -> Outcome {
        self.seen.push(opcode);
        Outcome::NoError
    }
}

#[test]
fn builtins_are_handled_and_the_rest_is_forwarded() {
    let (mut p, c) = RingChannel::new(ChannelOpts::default()).unwrap();
    p.write_command(NOOP, &[1, 2, 3]).unwrap();
    let token = p.insert_token().unwrap();
    p.write_command(COMMON_COMMAND_COUNT, &[]).unwrap();
    p.write_command(500, &[9]).unwrap();
    p.flush();

    let reg = TransferRegistry::new();
    let mut exec = CommonCommands::new(Domain::default());
    let mut parser = CommandParser::new(&c, &reg, 0, c.put_offset());
    let report = parser.process_commands(&mut exec, 10);

    assert_eq!(report.executed, 4);
    assert_eq!(report.last_recoverable, None);
    assert_eq!(c.token(), token);
    assert_eq!(p.last_token_read(), token);
    assert_eq!(exec.inner().seen, vec![COMMON_COMMAND_COUNT, 500]);
}

#[test]
fn set_token_requires_exactly_one_argument() {
    let (mut p, c) = RingChannel::new(ChannelOpts::default()).unwrap();
    p.write_command(SET_TOKEN, &[]).unwrap();
    p.write_command(SET_TOKEN, &[1, 2]).unwrap();
    p.flush();

    let reg = TransferRegistry::new();
    let mut exec = CommonCommands::new(Domain::default());
    let mut parser = CommandParser::new(&c, &reg, 0, c.put_offset());
    let report = parser.process_commands(&mut exec, 10);

    assert_eq!(report.recoverable_count, 2);
    assert_eq!(report.last_recoverable, Some(Outcome::InvalidArguments));
    assert_eq!(c.token(), 0);
    assert!(exec.inner().seen.is_empty());
}

#[test]
fn make_current_is_forwarded() {
    let mut exec = CommonCommands::new(Domain::default());
    assert!(exec.make_current());
    exec.inner_mut().bound += 10;
    assert_eq!(exec.into_inner().bound, 11);
}
