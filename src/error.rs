//! Rich diagnostic error types for the phasegate engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers can tell a malformed request
//! apart from a gate that simply did not pass. Goal non-satisfaction is never an
//! error: it is reported through [`crate::resolve::Evaluation`].

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the phasegate engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum GateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fact(#[from] FactError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Trail(#[from] TrailError),
}

// ---------------------------------------------------------------------------
// Fact store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FactError {
    #[error("unknown relation: \"{relation}\"")]
    #[diagnostic(
        code(phasegate::fact::unknown_relation),
        help(
            "The relation is not declared in the relation registry. \
             Declare it with `RelationRegistry::declare()` or check the spelling."
        )
    )]
    UnknownRelation { relation: String },

    #[error("duplicate functional fact: {relation}({initiative}, ...) is already asserted")]
    #[diagnostic(
        code(phasegate::fact::duplicate_functional),
        help(
            "This relation holds at most one value per initiative. \
             The original value was kept; correct the input instead of asserting twice."
        )
    )]
    DuplicateFunctionalFact { relation: String, initiative: String },

    #[error("arity mismatch for {relation}: expected {expected} value(s), got {actual}")]
    #[diagnostic(
        code(phasegate::fact::arity_mismatch),
        help("Pass exactly as many values as the relation schema declares.")
    )]
    ArityMismatch {
        relation: String,
        expected: usize,
        actual: usize,
    },

    #[error("kind mismatch for {relation} argument {position}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(phasegate::fact::kind_mismatch),
        help("Check the value type against the relation schema (bool, number, text or list).")
    )]
    KindMismatch {
        relation: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("no {relation} fact asserted for initiative \"{initiative}\"")]
    #[diagnostic(
        code(phasegate::fact::not_found),
        help("Assert the fact before querying it, or use `lookup()` to accept zero results.")
    )]
    FactNotFound { relation: String, initiative: String },

    #[error("failed to parse fact document: {message}")]
    #[diagnostic(
        code(phasegate::fact::document),
        help(
            "Fact documents are JSON objects keyed by initiative, each mapping \
             relation names to a value or an array of values."
        )
    )]
    Document { message: String },
}

// ---------------------------------------------------------------------------
// Numeric validator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidateError {
    #[error("invalid input for {metric}: {message}")]
    #[diagnostic(
        code(phasegate::validate::invalid_input),
        help(
            "The figures are outside the formula's domain (for example a \
             non-positive denominator). Correct the input; it is never coerced."
        )
    )]
    InvalidInput { metric: String, message: String },

    #[error("unknown validator: \"{name}\"")]
    #[diagnostic(
        code(phasegate::validate::unknown_validator),
        help("Known validators: roi, ltv_cac, margin, payback_months.")
    )]
    UnknownValidator { name: String },
}

// ---------------------------------------------------------------------------
// Categorical matcher errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CategoryError {
    #[error("unknown axis: \"{axis}\"")]
    #[diagnostic(
        code(phasegate::category::unknown_axis),
        help(
            "Builtin axes: simpler-alternative-checked, ai-code-generation-friendly, \
             single-command-deployable."
        )
    )]
    UnknownAxis { axis: String },

    #[error("axis \"{axis}\" is defined more than once")]
    #[diagnostic(
        code(phasegate::category::duplicate_axis),
        help("Each classification axis must appear once; merge the entries into one table.")
    )]
    DuplicateAxis { axis: String },
}

// ---------------------------------------------------------------------------
// Rule base errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    #[error("unknown goal: \"{goal}\"")]
    #[diagnostic(
        code(phasegate::rules::unknown_goal),
        help("List the defined goals with `phasegate goals`.")
    )]
    UnknownGoal { goal: String },

    #[error("goal \"{goal}\" is defined more than once")]
    #[diagnostic(
        code(phasegate::rules::duplicate_goal),
        help("Alternatives belong in one definition as separate clauses.")
    )]
    DuplicateGoal { goal: String },

    #[error("goal \"{goal}\" has no clauses")]
    #[diagnostic(
        code(phasegate::rules::empty_goal),
        help("A goal needs at least one clause; an empty clause list can never succeed.")
    )]
    EmptyGoal { goal: String },

    #[error("cyclic goal definition involving \"{goal}\"")]
    #[diagnostic(
        code(phasegate::rules::cyclic),
        help(
            "Goals form a DAG: no goal may depend on itself directly or through \
             sub-goals and quantifiers. Break the cycle in the rule base."
        )
    )]
    CyclicGoalDefinition { goal: String },

    #[error("goal \"{goal}\" references unknown relation \"{relation}\"")]
    #[diagnostic(
        code(phasegate::rules::unknown_relation),
        help("Declare the relation in the registry or fix the rule definition.")
    )]
    UnknownRelation { goal: String, relation: String },

    #[error("goal \"{goal}\" references unknown axis \"{axis}\"")]
    #[diagnostic(
        code(phasegate::rules::unknown_axis),
        help("Add the axis to the category tables or fix the rule definition.")
    )]
    UnknownAxis { goal: String, axis: String },

    #[error("goal \"{goal}\" reads the quantified element outside of a forall")]
    #[diagnostic(
        code(phasegate::rules::unbound_element),
        help("Only goals invoked through a `forall` term may use the element value source.")
    )]
    UnboundElement { goal: String },

    #[error("unknown phase: \"{name}\"")]
    #[diagnostic(
        code(phasegate::rules::unknown_phase),
        help("Phases are p0 through p5.")
    )]
    UnknownPhase { name: String },

    #[error("phase {phase} has no entry gate")]
    #[diagnostic(
        code(phasegate::rules::no_gate),
        help("P0 is the starting phase; gates exist for p1 through p5.")
    )]
    NoGate { phase: String },

    #[error("failed to parse rule definitions: {message}")]
    #[diagnostic(
        code(phasegate::rules::parse),
        help("Rule files are TOML with one [[goals]] table per goal definition.")
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(phasegate::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(phasegate::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(phasegate::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {message}")]
    #[diagnostic(
        code(phasegate::config::invalid),
        help("Thresholds and the budget cap must be finite; the budget cap must be positive.")
    )]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Decision trail errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TrailError {
    #[error("invalid decision record: {field}: {message}")]
    #[diagnostic(
        code(phasegate::trail::invalid_record),
        help("Confidence must lie in [0, 1] and the topic and chosen option must be non-empty.")
    )]
    InvalidRecord { field: String, message: String },

    #[error("failed to append decision record")]
    #[diagnostic(
        code(phasegate::trail::io),
        help("Check that the trail file is writable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize decision record: {message}")]
    #[diagnostic(code(phasegate::trail::serialize))]
    Serialize { message: String },
}

/// Convenience result type for phasegate operations.
pub type GateResult<T> = std::result::Result<T, GateError>;

pub type FactResult<T> = std::result::Result<T, FactError>;
pub type ValidateResult<T> = std::result::Result<T, ValidateError>;
pub type CategoryResult<T> = std::result::Result<T, CategoryError>;
pub type RuleResult<T> = std::result::Result<T, RuleError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type TrailResult<T> = std::result::Result<T, TrailError>;
