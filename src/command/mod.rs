//! Instruction decoding: outcomes, the executor seam, built-in opcodes and the parser.

/// Built-in `Noop` / `SetToken` opcodes.
pub mod common;
/// Executor trait and the context handed to it.
pub mod executor;
/// Per-instruction outcome taxonomy.
pub mod outcome;
/// Bounded instruction decoder.
pub mod parser;
