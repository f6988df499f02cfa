//! Numeric validation: financial ratios, their thresholds, and the budget rule.

pub mod budget;
pub mod numeric;
pub mod threshold;

pub use budget::{BudgetOutcome, BudgetRule, BudgetStage};
pub use numeric::{NumericOutcome, ltv_cac, margin, payback, roi, validate};
pub use threshold::{Comparison, Metric, Threshold, ThresholdTable};
