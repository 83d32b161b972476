//! Scripted producer sessions: a JSON model, a recording executor and the driver that replays one
//! through a scheduled processor.

/// The replay driver.
pub mod run;
/// JSON script model and stream encoding.
pub mod script;
/// Recording executor.
pub mod trace;

#[cfg(test)]
#[path = "../../tests/unit/replay/mod.rs"]
mod tests;
