use crate::foundation::error::{CmdbufError, CmdbufResult};

/// Fixed-width unit of the command stream. All offsets and sizes are counted in words.
pub type Word = u32;

/// Number of header bits holding the instruction length.
pub const LENGTH_BITS: u32 = 21;
/// Largest encodable instruction length in words, header included.
pub const MAX_COMMAND_LENGTH: u32 = (1 << LENGTH_BITS) - 1;
/// Largest encodable opcode.
pub const MAX_OPCODE: u32 = (1 << (32 - LENGTH_BITS)) - 1;

/// Decoded instruction header.
///
/// `length` counts the header word itself, so `length == 1` is a zero-argument instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CommandHeader {
    /// Instruction opcode.
    pub opcode: u32,
    /// Total instruction length in words, header included.
    pub length: u32,
}

impl CommandHeader {
    /// Create a header, rejecting values that do not fit the packed encoding.
    pub fn new(opcode: u32, length: u32) -> CmdbufResult<Self> {
        if opcode > MAX_OPCODE {
            return Err(CmdbufError::validation(format!(
                "opcode {opcode} exceeds {MAX_OPCODE}"
            )));
        }
        if length == 0 || length > MAX_COMMAND_LENGTH {
            return Err(CmdbufError::validation(format!(
                "command length {length} outside 1..={MAX_COMMAND_LENGTH}"
            )));
        }
        Ok(Self { opcode, length })
    }

    /// Header for an instruction carrying `arg_count` argument words.
    pub fn for_args(opcode: u32, arg_count: usize) -> CmdbufResult<Self> {
        let length = u32::try_from(arg_count)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| CmdbufError::validation("argument count overflows a header"))?;
        Self::new(opcode, length)
    }

    /// Unpack a header word. Never fails; a zero length is left for the parser to reject.
    pub fn decode(word: Word) -> Self {
        Self {
            opcode: word >> LENGTH_BITS,
            length: word & MAX_COMMAND_LENGTH,
        }
    }

    /// Pack into a header word.
    pub fn encode(self) -> Word {
        (self.opcode << LENGTH_BITS) | (self.length & MAX_COMMAND_LENGTH)
    }

    /// Number of argument words following the header.
    pub fn arg_count(self) -> u32 {
        self.length.saturating_sub(1)
    }
}

/// Encode one instruction (header followed by `args`) into words.
pub fn encode_command(opcode: u32, args: &[Word]) -> CmdbufResult<Vec<Word>> {
    let header = CommandHeader::for_args(opcode, args.len())?;
    let mut out = Vec::with_capacity(args.len() + 1);
    out.push(header.encode());
    out.extend_from_slice(args);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
