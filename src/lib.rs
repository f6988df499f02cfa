// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # phasegate
//!
//! A decision-gate validation engine. A declarative rule base decides whether
//! an initiative may advance through the lifecycle P0 → P5, based on financial
//! ratios and composable preconditions over facts the caller asserts.
//!
//! ## Architecture
//!
//! - **Fact store** (`fact`): typed, per-evaluation assertions keyed by initiative
//! - **Numeric validators** (`validate`): ROI, LTV:CAC, margin, payback, budget rule
//! - **Categorical matchers** (`category`): ordered first-match classification tables
//! - **Rule base** (`rules`): goals as ordered clauses of terms, checked acyclic
//! - **Resolution** (`resolve`): goal evaluation with a failure trace
//! - **Phases** (`phase`): the P0 → P5 state machine and gate decisions
//!
//! ## Library usage
//!
//! ```no_run
//! use phasegate::phase::Phase;
//! use phasegate::resolve::GateEngine;
//!
//! let engine = GateEngine::builtin();
//! let mut facts = engine.fact_store();
//! facts.assert_value("revenue", "acme", 10_000.0).unwrap();
//! facts.assert_value("costs", "acme", 2_000.0).unwrap();
//! let decision = engine.evaluate_gate(&facts, Phase::P3, "acme").unwrap();
//! println!("{decision}");
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod fact;
pub mod phase;
pub mod report;
pub mod resolve;
pub mod rules;
pub mod trail;
pub mod validate;
