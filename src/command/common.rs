use crate::command::executor::{ArgWords, CommandContext, Executor};
use crate::command::outcome::Outcome;

/// Padding instruction. Any length; arguments are ignored.
pub const NOOP: u32 = 0;
/// Publish `args[0]` as the channel token. Exactly one argument.
pub const SET_TOKEN: u32 = 1;
/// Opcodes below this value are handled by [`CommonCommands`].
pub const COMMON_COMMAND_COUNT: u32 = 2;

/// Executor adapter handling the built-in opcodes and forwarding the rest to `inner`.
#[derive(Debug, Default)]
pub struct CommonCommands<E> {
    inner: E,
}

impl<E: Executor> CommonCommands<E> {
    /// Wrap a domain executor.
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped executor.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Mutably borrow the wrapped executor.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    /// Unwrap.
    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Executor> Executor for CommonCommands<E> {
    fn make_current(&mut self) -> bool {
        self.inner.make_current()
    }

    fn execute(&mut self, cx: &CommandContext<'_>, opcode: u32, args: ArgWords<'_>) -> Outcome {
        match opcode {
            NOOP => Outcome::NoError,
            SET_TOKEN => match (args.len(), args.get(0)) {
                (1, Some(token)) => {
                    cx.set_token(token);
                    Outcome::NoError
                }
                _ => Outcome::InvalidArguments,
            },
            _ => self.inner.execute(cx, opcode, args),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/common.rs"]
mod tests;
