//! Error types.
//!
//! The resolution path itself never fails: no input text can make a turn
//! return an error. Configuration is the only fallible surface the library
//! owns; the model client reports its faults through `anyhow`, and a failed
//! model call is the caller's cue to proceed pattern-only, never a
//! user-visible error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),
}
