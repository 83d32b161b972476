/// Result of interpreting one instruction.
///
/// The set is closed and every kind is classified once, here: recoverable outcomes are latched and
/// decoding continues, fatal outcomes halt the channel for good.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Outcome {
    /// Success.
    #[default]
    NoError = 0,
    /// Undecodable opcode. Recoverable.
    UnknownCommand = 1,
    /// Opcode recognized, arguments malformed. Recoverable.
    InvalidArguments = 2,
    /// Declared length inconsistent with the buffer or the opcode's shape. Fatal.
    InvalidSize = 3,
    /// Instruction would read past the snapshotted `put`. Fatal.
    OutOfBounds = 4,
    /// Executor-reported internal failure. Fatal.
    GenericError = 5,
}

impl Outcome {
    /// Return `true` for anything but [`Outcome::NoError`].
    pub fn is_error(self) -> bool {
        self != Outcome::NoError
    }

    /// Return `true` when this outcome must poison the channel.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Outcome::InvalidSize | Outcome::OutOfBounds | Outcome::GenericError
        )
    }

    /// Return `true` for errors that are latched but let decoding continue.
    pub fn is_recoverable_error(self) -> bool {
        matches!(self, Outcome::UnknownCommand | Outcome::InvalidArguments)
    }

    /// Wire value stored in the channel's parse-error slot.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Inverse of [`Outcome::code`]. Unknown codes map to [`Outcome::GenericError`].
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Outcome::NoError,
            1 => Outcome::UnknownCommand,
            2 => Outcome::InvalidArguments,
            3 => Outcome::InvalidSize,
            4 => Outcome::OutOfBounds,
            _ => Outcome::GenericError,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::NoError => "no error",
            Outcome::UnknownCommand => "unknown command",
            Outcome::InvalidArguments => "invalid arguments",
            Outcome::InvalidSize => "invalid size",
            Outcome::OutOfBounds => "out of bounds",
            Outcome::GenericError => "generic error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/outcome.rs"]
mod tests;
