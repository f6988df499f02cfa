//! Goal definitions: goals are ordered clauses, clauses are conjunctions of terms.
//!
//! Definitions are plain data so they can be loaded from TOML as well as
//! constructed programmatically via [`super::RuleBase::builtin()`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validate::Metric;

// ---------------------------------------------------------------------------
// Fact predicates
// ---------------------------------------------------------------------------

/// A test over the facts of one relation for the initiative under evaluation.
///
/// Value tests look at the first argument of the first fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum FactPredicate {
    /// At least one fact is asserted.
    Asserted,
    /// No fact is asserted. The only negative test the engine supports.
    Absent,
    /// The value is boolean `true`.
    IsTrue,
    AtLeast { value: f64 },
    GreaterThan { value: f64 },
    /// `above < x <= up_to`.
    InRange { above: f64, up_to: f64 },
    /// The text value equals one of `values` (case-insensitive).
    OneOf { values: Vec<String> },
    /// The list value contains the element bound by the enclosing `forall`.
    ContainsElement,
}

impl FactPredicate {
    pub fn at_least(value: f64) -> Self {
        Self::AtLeast { value }
    }

    pub fn greater_than(value: f64) -> Self {
        Self::GreaterThan { value }
    }

    pub fn in_range(above: f64, up_to: f64) -> Self {
        Self::InRange { above, up_to }
    }

    pub fn one_of<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self::OneOf {
            values: values.into_iter().map(String::from).collect(),
        }
    }

    /// Whether the predicate can be decided without any fact present.
    pub fn tests_presence_only(&self) -> bool {
        matches!(self, Self::Asserted | Self::Absent)
    }
}

impl fmt::Display for FactPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asserted => f.write_str("asserted"),
            Self::Absent => f.write_str("absent"),
            Self::IsTrue => f.write_str("true"),
            Self::AtLeast { value } => write!(f, ">= {value}"),
            Self::GreaterThan { value } => write!(f, "> {value}"),
            Self::InRange { above, up_to } => write!(f, "in ({above}, {up_to}]"),
            Self::OneOf { values } => write!(f, "in {{{}}}", values.join(", ")),
            Self::ContainsElement => f.write_str("contains element"),
        }
    }
}

// ---------------------------------------------------------------------------
// Value source
// ---------------------------------------------------------------------------

/// Where a categorical check takes the value it classifies from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The element bound by the enclosing `forall`.
    Element,
    Literal(String),
    /// The first text argument of the first fact of this relation.
    Fact(String),
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element => f.write_str("element"),
            Self::Literal(v) => write!(f, "\"{v}\""),
            Self::Fact(relation) => write!(f, "{relation}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// One conjunct of a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    Fact {
        relation: String,
        predicate: FactPredicate,
    },
    /// A numeric validator whose inputs are read from functional relations.
    Numeric { metric: Metric, inputs: Vec<String> },
    /// Passes only on an `Accepted` verdict.
    Category { axis: String, value: ValueSource },
    /// Another goal, for the same initiative.
    Goal { name: String },
    /// Universal quantification over the elements of a list fact. Vacuously
    /// true for an empty or missing collection.
    ForAll { collection: String, goal: String },
}

impl Term {
    pub fn fact(relation: impl Into<String>, predicate: FactPredicate) -> Self {
        Self::Fact {
            relation: relation.into(),
            predicate,
        }
    }

    /// A numeric check fed by the metric's default input relations.
    pub fn numeric(metric: Metric) -> Self {
        Self::Numeric {
            metric,
            inputs: metric.input_names().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn numeric_from(metric: Metric, inputs: [&str; 2]) -> Self {
        Self::Numeric {
            metric,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn category(axis: impl Into<String>, value: ValueSource) -> Self {
        Self::Category {
            axis: axis.into(),
            value,
        }
    }

    pub fn goal(name: impl Into<String>) -> Self {
        Self::Goal { name: name.into() }
    }

    pub fn for_all(collection: impl Into<String>, goal: impl Into<String>) -> Self {
        Self::ForAll {
            collection: collection.into(),
            goal: goal.into(),
        }
    }

    /// The goal this term depends on, if any.
    pub fn goal_ref(&self) -> Option<&str> {
        match self {
            Self::Goal { name } => Some(name.as_str()),
            Self::ForAll { goal, .. } => Some(goal.as_str()),
            _ => None,
        }
    }

    /// Relations this term reads.
    pub fn relations(&self) -> Vec<&str> {
        match self {
            Self::Fact { relation, .. } => vec![relation.as_str()],
            Self::Numeric { inputs, .. } => inputs.iter().map(String::as_str).collect(),
            Self::Category {
                value: ValueSource::Fact(relation),
                ..
            } => vec![relation.as_str()],
            Self::ForAll { collection, .. } => vec![collection.as_str()],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact {
                relation,
                predicate,
            } => write!(f, "fact({relation} {predicate})"),
            Self::Numeric { metric, inputs } => {
                write!(f, "numeric({metric}: {})", inputs.join(", "))
            }
            Self::Category { axis, value } => write!(f, "category({axis}: {value})"),
            Self::Goal { name } => write!(f, "goal({name})"),
            Self::ForAll { collection, goal } => write!(f, "forall({collection}: {goal})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Clauses and goals
// ---------------------------------------------------------------------------

/// A conjunction of terms, evaluated left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub terms: Vec<Term>,
}

impl Clause {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }
}

/// A named goal: an ordered disjunction of clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub clauses: Vec<Clause>,
}

impl GoalDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            clauses: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an alternative clause.
    pub fn clause(mut self, terms: Vec<Term>) -> Self {
        self.clauses.push(Clause::new(terms));
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.clauses.iter().flat_map(|c| c.terms.iter())
    }
}
