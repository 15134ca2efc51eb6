// src/replay/mod.rs

//! Host simulation: replaying a scripted sequence of lifecycle events and
//! scheduler calls against a live runtime.

pub mod driver;
pub mod script;

pub use driver::{ReplayDriver, TranscriptEntry};
pub use script::{ObserveFields, ScriptLine, ScriptParser, ScriptStep};
