//! Threshold table: the single source of truth for numeric pass/fail bars.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidateError, ValidateResult};

/// The numeric validators known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Roi,
    LtvCac,
    Margin,
    PaybackMonths,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Roi,
        Metric::LtvCac,
        Metric::Margin,
        Metric::PaybackMonths,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Roi => "roi",
            Self::LtvCac => "ltv_cac",
            Self::Margin => "margin",
            Self::PaybackMonths => "payback_months",
        }
    }

    /// Parse a validator name. Accepts a few spellings used by callers.
    pub fn parse(name: &str) -> ValidateResult<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "roi" => Ok(Self::Roi),
            "ltv_cac" | "ltv:cac" | "ltvcac" => Ok(Self::LtvCac),
            "margin" => Ok(Self::Margin),
            "payback_months" | "payback" => Ok(Self::PaybackMonths),
            _ => Err(ValidateError::UnknownValidator {
                name: name.to_string(),
            }),
        }
    }

    /// Names of the formula inputs, in argument order.
    pub fn input_names(self) -> [&'static str; 2] {
        match self {
            Self::Roi | Self::Margin => ["revenue", "costs"],
            Self::LtvCac => ["ltv", "cac"],
            Self::PaybackMonths => ["cac", "monthly_revenue_per_customer"],
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
        })
    }
}

/// A comparison direction and bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: f64,
}

impl Threshold {
    pub const fn at_least(value: f64) -> Self {
        Self {
            comparison: Comparison::AtLeast,
            value,
        }
    }

    pub const fn at_most(value: f64) -> Self {
        Self {
            comparison: Comparison::AtMost,
            value,
        }
    }

    pub fn passes(&self, computed: f64) -> bool {
        match self.comparison {
            Comparison::AtLeast => computed >= self.value,
            Comparison::AtMost => computed <= self.value,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparison, self.value)
    }
}

/// Thresholds per validator. Immutable once an engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    #[serde(default = "default_roi")]
    pub roi: Threshold,
    #[serde(default = "default_ltv_cac")]
    pub ltv_cac: Threshold,
    #[serde(default = "default_margin")]
    pub margin: Threshold,
    #[serde(default = "default_payback_months")]
    pub payback_months: Threshold,
}

fn default_roi() -> Threshold {
    Threshold::at_least(1.5)
}
fn default_ltv_cac() -> Threshold {
    Threshold::at_least(3.0)
}
fn default_margin() -> Threshold {
    Threshold::at_least(20.0)
}
fn default_payback_months() -> Threshold {
    Threshold::at_most(12.0)
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            roi: default_roi(),
            ltv_cac: default_ltv_cac(),
            margin: default_margin(),
            payback_months: default_payback_months(),
        }
    }
}

impl ThresholdTable {
    pub fn get(&self, metric: Metric) -> Threshold {
        match metric {
            Metric::Roi => self.roi,
            Metric::LtvCac => self.ltv_cac,
            Metric::Margin => self.margin,
            Metric::PaybackMonths => self.payback_months,
        }
    }

    /// Replace the threshold for one metric.
    pub fn with(mut self, metric: Metric, threshold: Threshold) -> Self {
        match metric {
            Metric::Roi => self.roi = threshold,
            Metric::LtvCac => self.ltv_cac = threshold,
            Metric::Margin => self.margin = threshold,
            Metric::PaybackMonths => self.payback_months = threshold,
        }
        self
    }

    /// Every bar must be a finite number.
    pub fn is_valid(&self) -> bool {
        Metric::ALL.iter().all(|&m| self.get(m).value.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gate_policy() {
        let table = ThresholdTable::default();
        assert_eq!(table.get(Metric::Roi), Threshold::at_least(1.5));
        assert_eq!(table.get(Metric::LtvCac), Threshold::at_least(3.0));
        assert_eq!(table.get(Metric::Margin), Threshold::at_least(20.0));
        assert_eq!(table.get(Metric::PaybackMonths), Threshold::at_most(12.0));
    }

    #[test]
    fn comparison_is_inclusive() {
        assert!(Threshold::at_least(1.5).passes(1.5));
        assert!(!Threshold::at_least(1.5).passes(1.4999));
        assert!(Threshold::at_most(12.0).passes(12.0));
        assert!(!Threshold::at_most(12.0).passes(12.01));
    }

    #[test]
    fn metric_names_round_trip_through_parse() {
        for metric in Metric::ALL {
            assert_eq!(Metric::parse(metric.name()).unwrap(), metric);
        }
        assert_eq!(Metric::parse("LTV-CAC").unwrap(), Metric::LtvCac);
        assert!(Metric::parse("ebitda").is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let table: ThresholdTable = toml::from_str(
            r#"
            [roi]
            comparison = ">="
            value = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(table.roi, Threshold::at_least(2.0));
        assert_eq!(table.payback_months, Threshold::at_most(12.0));
    }
}
