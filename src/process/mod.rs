//! Tick scheduling: the processor core, the host-loop seam and continuation posting.

/// The per-tick processing core.
pub mod processor;
/// Self-rescheduling wrapper around a processor.
pub mod scheduled;
/// Host loop abstraction and a local FIFO implementation.
pub mod scheduler;
