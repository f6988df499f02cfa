//! Budget rule: a numeric check kept apart from the phase gates.
//!
//! While an initiative is still being validated (P0–P2) spending must stay
//! within the cap. From P3 on the return must recoup the whole cap, i.e.
//! `min(cap, profit) >= cap`.

use serde::{Deserialize, Serialize};

use crate::error::{ValidateError, ValidateResult};

/// Which side of the budget rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStage {
    /// P0–P2: spending is capped.
    Investment,
    /// P3 onward: the cap must be returned.
    Return,
}

/// Outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetOutcome {
    pub stage: BudgetStage,
    /// `spent` for the investment stage, `min(cap, profit)` for the return stage.
    pub computed: f64,
    pub cap: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRule {
    pub cap: f64,
}

impl Default for BudgetRule {
    fn default() -> Self {
        Self { cap: 100.0 }
    }
}

impl BudgetRule {
    pub fn new(cap: f64) -> Self {
        Self { cap }
    }

    pub fn check(&self, stage: BudgetStage, spent: f64, profit: f64) -> ValidateResult<BudgetOutcome> {
        let invalid = |message: String| ValidateError::InvalidInput {
            metric: "budget".into(),
            message,
        };
        if !spent.is_finite() || !profit.is_finite() {
            return Err(invalid(format!(
                "spent and profit must be finite, got {spent} and {profit}"
            )));
        }
        if spent < 0.0 {
            return Err(invalid(format!("spent must not be negative, got {spent}")));
        }

        let (computed, passed) = match stage {
            BudgetStage::Investment => (spent, spent <= self.cap),
            BudgetStage::Return => {
                let recouped = self.cap.min(profit);
                (recouped, recouped >= self.cap)
            }
        };

        Ok(BudgetOutcome {
            stage,
            computed,
            cap: self.cap,
            passed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn investment_stage_caps_spending() {
        let rule = BudgetRule::default();
        assert!(rule.check(BudgetStage::Investment, 100.0, 0.0).unwrap().passed);
        assert!(!rule.check(BudgetStage::Investment, 100.01, 0.0).unwrap().passed);
    }

    #[test]
    fn return_stage_requires_full_recoup() {
        let rule = BudgetRule::default();
        let short = rule.check(BudgetStage::Return, 100.0, 60.0).unwrap();
        assert_eq!(short.computed, 60.0);
        assert!(!short.passed);

        let recouped = rule.check(BudgetStage::Return, 100.0, 450.0).unwrap();
        assert_eq!(recouped.computed, 100.0);
        assert!(recouped.passed);
    }

    #[test]
    fn rejects_malformed_figures() {
        let rule = BudgetRule::default();
        assert!(rule.check(BudgetStage::Investment, -1.0, 0.0).is_err());
        assert!(rule.check(BudgetStage::Return, 10.0, f64::NAN).is_err());
    }
}
