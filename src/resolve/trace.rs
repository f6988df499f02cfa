//! Evaluation results and failure traces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::Classification;
use crate::fact::Value;
use crate::validate::NumericOutcome;

/// Why a single term did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// A fact the term needs was never asserted.
    MissingFact { relation: String },
    /// The fact exists but its value fails the predicate.
    PredicateFailed { relation: String, actual: Value },
    /// The validator computed a valid figure that misses its bar.
    ThresholdNotMet { outcome: NumericOutcome },
    /// The categorical matcher did not accept the value.
    Verdict { classification: Classification },
    /// A sub-goal was not satisfied; see `cause`.
    SubGoalFailed { goal: String },
    /// One element of a `forall` collection failed its goal; see `cause`.
    ElementFailed { element: String, goal: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFact { relation } => write!(f, "no {relation} fact"),
            Self::PredicateFailed { relation, actual } => {
                write!(f, "{relation} is {actual}")
            }
            Self::ThresholdNotMet { outcome } => write!(
                f,
                "{} {:.3} does not meet {}",
                outcome.metric, outcome.computed, outcome.threshold
            ),
            Self::Verdict { classification } => {
                write!(
                    f,
                    "{} is {} on {}",
                    classification.value, classification.verdict, classification.axis
                )?;
                if let Some(advice) = &classification.advice {
                    write!(f, " ({advice})")?;
                }
                Ok(())
            }
            Self::SubGoalFailed { goal } => write!(f, "{goal} not satisfied"),
            Self::ElementFailed { element, goal } => {
                write!(f, "{goal} not satisfied for \"{element}\"")
            }
        }
    }
}

/// The first failing term of a goal, linked to the failure that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTerm {
    /// Goal whose clause contained the term.
    pub goal: String,
    /// Zero-based clause index within the goal.
    pub clause: usize,
    /// Zero-based term index within the clause.
    pub term_index: usize,
    /// Rendered term, e.g. `numeric(roi: revenue, costs)`.
    pub term: String,
    pub reason: FailureReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FailedTerm>>,
}

impl FailedTerm {
    /// The innermost failure: the leaf fact, numeric, or categorical check.
    pub fn root_cause(&self) -> &FailedTerm {
        let mut current = self;
        while let Some(cause) = &current.cause {
            current = cause;
        }
        current
    }

    /// Goals from the evaluated goal down to the root cause.
    pub fn goal_path(&self) -> Vec<&str> {
        let mut path = vec![self.goal.as_str()];
        let mut current = self;
        while let Some(cause) = &current.cause {
            path.push(cause.goal.as_str());
            current = cause;
        }
        path
    }
}

impl fmt::Display for FailedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.goal, self.term, self.reason)?;
        if let Some(cause) = &self.cause {
            write!(f, " <- {cause}")?;
        }
        Ok(())
    }
}

/// Result of evaluating one goal for one initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub goal: String,
    pub initiative: String,
    pub satisfied: bool,
    /// Present exactly when `satisfied` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_term: Option<FailedTerm>,
}

impl Evaluation {
    pub(crate) fn new(goal: &str, initiative: &str, failure: Option<FailedTerm>) -> Self {
        Self {
            goal: goal.to_string(),
            initiative: initiative.to_string(),
            satisfied: failure.is_none(),
            failing_term: failure,
        }
    }

    /// The leaf check responsible for the failure, if any.
    pub fn root_cause(&self) -> Option<&FailedTerm> {
        self.failing_term.as_ref().map(FailedTerm::root_cause)
    }
}

/// Status of one term in a non-short-circuiting checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TermStatus {
    Passed,
    Failed { failure: FailedTerm },
    /// The term could not be evaluated, e.g. invalid numeric input.
    Error { message: String },
}

/// One row of a gate checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCheck {
    pub term: String,
    pub status: TermStatus,
}

impl TermCheck {
    pub fn passed(&self) -> bool {
        matches!(self.status, TermStatus::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> FailedTerm {
        FailedTerm {
            goal: "roiPositive".into(),
            clause: 0,
            term_index: 0,
            term: "numeric(roi: revenue, costs)".into(),
            reason: FailureReason::MissingFact {
                relation: "costs".into(),
            },
            cause: None,
        }
    }

    #[test]
    fn root_cause_walks_to_leaf() {
        let top = FailedTerm {
            goal: "canProceedToP3".into(),
            clause: 0,
            term_index: 2,
            term: "goal(roiPositive)".into(),
            reason: FailureReason::SubGoalFailed {
                goal: "roiPositive".into(),
            },
            cause: Some(Box::new(leaf())),
        };
        assert_eq!(top.root_cause(), &leaf());
        assert_eq!(top.goal_path(), vec!["canProceedToP3", "roiPositive"]);
        assert_eq!(
            top.to_string(),
            "canProceedToP3: goal(roiPositive): roiPositive not satisfied \
             <- roiPositive: numeric(roi: revenue, costs): no costs fact"
        );
    }

    #[test]
    fn satisfied_evaluation_has_no_trace() {
        let eval = Evaluation::new("g", "acme", None);
        assert!(eval.satisfied);
        assert!(eval.root_cause().is_none());

        let failed = Evaluation::new("g", "acme", Some(leaf()));
        assert!(!failed.satisfied);
        assert_eq!(failed.root_cause().map(|f| f.goal.as_str()), Some("roiPositive"));
    }
}
