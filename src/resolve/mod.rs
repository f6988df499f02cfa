//! Resolution engine: decides goals for an initiative against a fact store.

pub mod engine;
pub mod trace;

pub use engine::GateEngine;
pub use trace::{Evaluation, FailedTerm, FailureReason, TermCheck, TermStatus};
