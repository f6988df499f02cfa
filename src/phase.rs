//! The fixed P0 → P5 lifecycle and gate decisions between phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};
use crate::resolve::Evaluation;
use crate::rules::builtin::{
    CAN_PROCEED_TO_P1, CAN_PROCEED_TO_P2, CAN_PROCEED_TO_P3, CAN_PROCEED_TO_P4, CAN_PROCEED_TO_P5,
};
use crate::validate::BudgetStage;

/// Lifecycle phase of an initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::P0,
        Phase::P1,
        Phase::P2,
        Phase::P3,
        Phase::P4,
        Phase::P5,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Phase> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// The goal guarding entry into this phase. P0 has none.
    pub fn gate_goal(self) -> Option<&'static str> {
        match self {
            Phase::P0 => None,
            Phase::P1 => Some(CAN_PROCEED_TO_P1),
            Phase::P2 => Some(CAN_PROCEED_TO_P2),
            Phase::P3 => Some(CAN_PROCEED_TO_P3),
            Phase::P4 => Some(CAN_PROCEED_TO_P4),
            Phase::P5 => Some(CAN_PROCEED_TO_P5),
        }
    }

    /// Spending is capped through P2; from P3 on the cap must be returned.
    pub fn budget_stage(self) -> BudgetStage {
        if self < Phase::P3 {
            BudgetStage::Investment
        } else {
            BudgetStage::Return
        }
    }

    /// Parse `p3`, `P3`, or `3`.
    pub fn parse(name: &str) -> RuleResult<Self> {
        let trimmed = name.trim();
        let digits = trimmed
            .strip_prefix(['p', 'P'])
            .unwrap_or(trimmed);
        digits
            .parse::<usize>()
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| RuleError::UnknownPhase {
                name: name.to_string(),
            })
    }
}

impl FromStr for Phase {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Outcome of evaluating the gate from one phase into the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub from: Phase,
    pub to: Phase,
    pub evaluation: Evaluation,
}

impl GateDecision {
    pub fn new(from: Phase, to: Phase, evaluation: Evaluation) -> Self {
        Self {
            from,
            to,
            evaluation,
        }
    }

    pub fn proceed(&self) -> bool {
        self.evaluation.satisfied
    }

    /// Gate title, e.g. `P2 → P3 (Week 6 - Sacred $100 decision)`.
    pub fn title(&self) -> String {
        let base = format!("{} → {}", self.from, self.to);
        match self.to {
            Phase::P3 => format!("{base} (Week 6 - Sacred $100 decision)"),
            Phase::P5 => format!("{base} (Week 10 - Sustainability check)"),
            _ => base,
        }
    }

    /// `PROCEED` or `HALT`, with the gate-specific consequence where one exists.
    pub fn verdict(&self) -> &'static str {
        match (self.to, self.proceed()) {
            (Phase::P3, true) => "PROCEED (return $100)",
            (Phase::P3, false) => "HALT (keep $100)",
            (Phase::P5, true) => "PROCEED (iterate)",
            (Phase::P5, false) => "HALT (pivot or kill)",
            (_, true) => "PROCEED",
            (_, false) => "HALT",
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.verdict())?;
        if let Some(failure) = &self.evaluation.failing_term {
            write!(f, "\n  blocked by {}", failure.root_cause())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        assert_eq!(Phase::P0.next(), Some(Phase::P1));
        assert_eq!(Phase::P5.next(), None);
        assert_eq!(Phase::P0.previous(), None);
        assert_eq!(Phase::P3.previous(), Some(Phase::P2));
        assert!(Phase::P0.gate_goal().is_none());
        assert_eq!(Phase::P3.gate_goal(), Some(CAN_PROCEED_TO_P3));
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Phase::parse("p3").unwrap(), Phase::P3);
        assert_eq!(Phase::parse(" P5 ").unwrap(), Phase::P5);
        assert_eq!("2".parse::<Phase>().unwrap(), Phase::P2);
        assert!(matches!(
            Phase::parse("p6"),
            Err(RuleError::UnknownPhase { .. })
        ));
        assert!(Phase::parse("launch").is_err());
    }

    #[test]
    fn budget_stage_switches_at_p3() {
        assert_eq!(Phase::P2.budget_stage(), BudgetStage::Investment);
        assert_eq!(Phase::P3.budget_stage(), BudgetStage::Return);
        assert_eq!(Phase::P5.budget_stage(), BudgetStage::Return);
    }

    #[test]
    fn gate_wording() {
        let halted = GateDecision::new(
            Phase::P2,
            Phase::P3,
            Evaluation {
                goal: CAN_PROCEED_TO_P3.into(),
                initiative: "acme".into(),
                satisfied: false,
                failing_term: None,
            },
        );
        assert_eq!(halted.verdict(), "HALT (keep $100)");
        assert_eq!(halted.title(), "P2 → P3 (Week 6 - Sacred $100 decision)");

        let proceed = GateDecision::new(
            Phase::P0,
            Phase::P1,
            Evaluation {
                goal: CAN_PROCEED_TO_P1.into(),
                initiative: "acme".into(),
                satisfied: true,
                failing_term: None,
            },
        );
        assert_eq!(proceed.to_string(), "P0 → P1: PROCEED");
    }
}
