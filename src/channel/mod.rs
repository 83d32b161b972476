//! Shared channel state: the instruction ring and the transfer-buffer registry.
//!
//! The ring has two ends with separate handle types. [`ring::RingProducer`] is the sole writer of
//! `put`, [`ring::RingConsumer`] the sole writer of `get`.

/// Ring buffer and its producer/consumer ends.
pub mod ring;
/// Transfer-buffer registry.
pub mod transfer;
