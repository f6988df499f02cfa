//! Numeric validators: ROI, LTV:CAC, margin, and payback period.
//!
//! Each validator takes raw figures (it never reads facts itself) and returns
//! the computed value together with the pass/fail verdict against the
//! [`ThresholdTable`]. Inputs outside a formula's domain produce
//! [`ValidateError::InvalidInput`], which callers can always tell apart from a
//! valid figure that misses its bar.

use serde::{Deserialize, Serialize};

use crate::error::{ValidateError, ValidateResult};

use super::threshold::{Metric, Threshold, ThresholdTable};

/// Result of one numeric validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericOutcome {
    pub metric: Metric,
    pub computed: f64,
    pub threshold: Threshold,
    pub passed: bool,
}

impl NumericOutcome {
    fn new(metric: Metric, computed: f64, table: &ThresholdTable) -> Self {
        let threshold = table.get(metric);
        Self {
            metric,
            computed,
            threshold,
            passed: threshold.passes(computed),
        }
    }
}

fn invalid(metric: Metric, message: impl Into<String>) -> ValidateError {
    ValidateError::InvalidInput {
        metric: metric.name().to_string(),
        message: message.into(),
    }
}

fn require_finite(metric: Metric, figures: &[(&str, f64)]) -> ValidateResult<()> {
    for (name, value) in figures {
        if !value.is_finite() {
            return Err(invalid(metric, format!("{name} must be a finite number, got {value}")));
        }
    }
    Ok(())
}

fn require_positive(metric: Metric, name: &str, value: f64) -> ValidateResult<()> {
    if value <= 0.0 {
        return Err(invalid(metric, format!("{name} must be positive, got {value}")));
    }
    Ok(())
}

/// `(revenue - costs) / costs`.
pub fn roi(revenue: f64, costs: f64, table: &ThresholdTable) -> ValidateResult<NumericOutcome> {
    let metric = Metric::Roi;
    require_finite(metric, &[("revenue", revenue), ("costs", costs)])?;
    require_positive(metric, "costs", costs)?;
    Ok(NumericOutcome::new(metric, (revenue - costs) / costs, table))
}

/// `ltv / cac`.
pub fn ltv_cac(ltv: f64, cac: f64, table: &ThresholdTable) -> ValidateResult<NumericOutcome> {
    let metric = Metric::LtvCac;
    require_finite(metric, &[("ltv", ltv), ("cac", cac)])?;
    require_positive(metric, "cac", cac)?;
    Ok(NumericOutcome::new(metric, ltv / cac, table))
}

/// `((revenue - costs) / revenue) * 100`.
pub fn margin(revenue: f64, costs: f64, table: &ThresholdTable) -> ValidateResult<NumericOutcome> {
    let metric = Metric::Margin;
    require_finite(metric, &[("revenue", revenue), ("costs", costs)])?;
    require_positive(metric, "revenue", revenue)?;
    Ok(NumericOutcome::new(
        metric,
        ((revenue - costs) / revenue) * 100.0,
        table,
    ))
}

/// `cac / monthly_revenue_per_customer`, in months.
pub fn payback(
    cac: f64,
    monthly_revenue_per_customer: f64,
    table: &ThresholdTable,
) -> ValidateResult<NumericOutcome> {
    let metric = Metric::PaybackMonths;
    require_finite(
        metric,
        &[
            ("cac", cac),
            ("monthly_revenue_per_customer", monthly_revenue_per_customer),
        ],
    )?;
    require_positive(
        metric,
        "monthly_revenue_per_customer",
        monthly_revenue_per_customer,
    )?;
    Ok(NumericOutcome::new(
        metric,
        cac / monthly_revenue_per_customer,
        table,
    ))
}

/// Dispatch to the validator for `metric` with positional inputs.
pub fn validate(
    metric: Metric,
    inputs: &[f64],
    table: &ThresholdTable,
) -> ValidateResult<NumericOutcome> {
    let &[a, b] = inputs else {
        let [first, second] = metric.input_names();
        return Err(invalid(
            metric,
            format!(
                "expected 2 inputs ({first}, {second}), got {}",
                inputs.len()
            ),
        ));
    };
    match metric {
        Metric::Roi => roi(a, b, table),
        Metric::LtvCac => ltv_cac(a, b, table),
        Metric::Margin => margin(a, b, table),
        Metric::PaybackMonths => payback(a, b, table),
    }
}
