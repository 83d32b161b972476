use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::channel::ring::ChannelOpts;
use crate::command::common::SET_TOKEN;
use crate::command::outcome::Outcome;
use crate::foundation::core::{Word, encode_command};
use crate::foundation::error::{CmdbufError, CmdbufResult};
use crate::process::processor::ProcessorOpts;

/// One producer action in a replay script.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Write an encoded instruction.
    Command {
        /// Opcode.
        opcode: u32,
        /// Argument words.
        #[serde(default)]
        args: Vec<Word>,
    },
    /// Write words verbatim, malformed headers included.
    Raw {
        /// Words to write.
        words: Vec<Word>,
    },
    /// Write a `SetToken` instruction with the next token.
    Token,
}

/// JSON-facing description of a producer session to replay through a processor.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayScript {
    /// Ring configuration.
    pub channel: ChannelOpts,
    /// Processor configuration.
    pub processor: ProcessorOpts,
    /// Transfer buffers registered before replay, as initial word contents. Ids are assigned from 1.
    pub transfers: Vec<Vec<Word>>,
    /// Outcome returned by the trace executor for specific opcodes (all others succeed).
    pub outcomes: BTreeMap<u32, Outcome>,
    /// Make the executor refuse to bind its context.
    pub fail_bind: bool,
    /// Producer actions, in order.
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Parse a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CmdbufResult<Self> {
        let script: Self = serde_json::from_reader(r)
            .map_err(|e| CmdbufError::serde(format!("parse replay script JSON: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Parse a script from a JSON string.
    pub fn from_json(s: &str) -> CmdbufResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CmdbufResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CmdbufError::validation(format!("open replay script '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate the embedded configuration.
    pub fn validate(&self) -> CmdbufResult<()> {
        self.channel.validate()?;
        self.processor.validate()
    }

    /// Encode every step as a flat word stream, ignoring ring wrap.
    ///
    /// Tokens are numbered from 1 in step order, as the producer would number them.
    pub fn encode_words(&self) -> CmdbufResult<Vec<Word>> {
        let mut out = Vec::new();
        let mut token = 0u32;
        for step in &self.steps {
            match step {
                ScriptStep::Command { opcode, args } => {
                    out.extend(encode_command(*opcode, args)?);
                }
                ScriptStep::Raw { words } => out.extend_from_slice(words),
                ScriptStep::Token => {
                    token = (token + 1) & 0x7fff_ffff;
                    out.extend(encode_command(SET_TOKEN, &[token])?);
                }
            }
        }
        Ok(out)
    }
}
