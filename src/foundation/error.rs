/// Result alias for API-level failures.
pub type CmdbufResult<T> = Result<T, CmdbufError>;

/// Errors reported to callers of the channel, registry and processor APIs.
///
/// Instruction-stream failures are not errors in this sense: they are [`crate::Outcome`] values
/// latched on the channel.
#[derive(thiserror::Error, Debug)]
pub enum CmdbufError {
    /// Invalid configuration or argument.
    #[error("validation error: {0}")]
    Validation(String),

    /// The producer tried to write more words than the ring has free.
    #[error("ring full: need {needed} words, {available} available")]
    RingFull {
        /// Words the write required.
        needed: u32,
        /// Words free at the time of the write.
        available: u32,
    },

    /// A transfer buffer lookup missed.
    #[error("unknown transfer buffer id {0}")]
    UnknownTransferBuffer(i32),

    /// A tick was requested while another tick of the same processor was running.
    #[error("processor is already running a tick")]
    Reentrant,

    /// Script or config (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CmdbufError {
    /// Build a [`CmdbufError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CmdbufError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
