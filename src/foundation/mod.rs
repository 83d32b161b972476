//! Shared primitives: words and headers, API errors, shared memory regions.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod shared;
