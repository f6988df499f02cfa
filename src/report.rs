//! Markdown validation report for one initiative.
//!
//! Sections appear only when the facts they need are present: ROI needs
//! `revenue` and `costs`, unit economics needs `ltv` and `cac`, and the tech
//! stack section needs `tech_stack`. The gate section lists every term of the
//! gate's clause, so it shows all open checks instead of only the first.

use crate::category::{SIMPLER_ALTERNATIVE_CHECKED, Verdict};
use crate::error::{GateError, GateResult};
use crate::fact::FactStore;
use crate::phase::Phase;
use crate::resolve::{GateEngine, TermStatus};
use crate::rules::builtin::TECH_CHOICE_RECOMMENDED;
use crate::validate::{Metric, NumericOutcome};

const PASS: &str = "✓";
const FAIL: &str = "✗";

/// Render the report. `target` selects the gate section: the phase the
/// initiative wants to enter.
pub fn validation_report(
    engine: &GateEngine,
    store: &FactStore,
    initiative: &str,
    target: Option<Phase>,
) -> GateResult<String> {
    let mut lines = vec![format!("# Validation Report: {initiative}"), String::new()];

    let number = |relation: &str| -> GateResult<Option<f64>> {
        Ok(store
            .first_value(relation, initiative)?
            .and_then(|v| v.as_number()))
    };

    if let (Some(revenue), Some(costs)) = (number("revenue")?, number("costs")?) {
        lines.push("## ROI Validation".into());
        lines.push(numeric_line(engine.validate_numeric(
            Metric::Roi.name(),
            &[revenue, costs],
        )));
        lines.push(String::new());
    }

    if let (Some(ltv), Some(cac)) = (number("ltv")?, number("cac")?) {
        lines.push("## Unit Economics Validation".into());
        lines.push(numeric_line(
            engine.validate_numeric(Metric::LtvCac.name(), &[ltv, cac]),
        ));
        if let Some(monthly) = number("monthly_revenue_per_customer")? {
            lines.push(numeric_line(engine.validate_numeric(
                Metric::PaybackMonths.name(),
                &[cac, monthly],
            )));
        }
        lines.push(String::new());
    }

    if let Some(target) = target {
        let decision = engine.evaluate_gate(store, target, initiative)?;
        lines.push(format!("## Phase Gate: {}", decision.title()));
        if let Some(goal) = target.gate_goal() {
            for check in engine.checklist(store, goal, initiative)? {
                lines.push(match check.status {
                    TermStatus::Passed => format!("- {PASS} {}", check.term),
                    TermStatus::Failed { failure } => {
                        format!("- {FAIL} {}: {}", check.term, failure.root_cause().reason)
                    }
                    TermStatus::Error { message } => {
                        format!("- {FAIL} {}: error: {message}", check.term)
                    }
                });
            }
        }
        lines.push(format!("- Decision: **{}**", decision.verdict()));
        lines.push(String::new());
    }

    let stack = store
        .first_value("tech_stack", initiative)?
        .and_then(|v| v.as_list())
        .unwrap_or(&[]);
    if !stack.is_empty() {
        lines.push("## Tech Stack Validation".into());
        let mut approved = 0;
        for tech in stack {
            let eval =
                engine.evaluate_for_element(store, TECH_CHOICE_RECOMMENDED, initiative, tech)?;
            if eval.satisfied {
                approved += 1;
                lines.push(format!("- {tech}: {PASS} Approved"));
            } else {
                lines.push(format!("- {tech}: ⚠ Reconsider"));
            }
            let simpler = engine.explain(SIMPLER_ALTERNATIVE_CHECKED, tech)?;
            if simpler.verdict != Verdict::Accepted {
                if let Some(advice) = simpler.advice {
                    lines.push(format!("  ⚠ {advice}"));
                }
            }
        }
        lines.push(if approved == stack.len() {
            "- Overall: Stack approved".into()
        } else {
            "- Overall: Stack needs review".into()
        });
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

fn numeric_line(result: GateResult<NumericOutcome>) -> String {
    match result {
        Ok(outcome) => format!(
            "- {}: {:.2} (threshold: {}) {}",
            outcome.metric,
            outcome.computed,
            outcome.threshold,
            if outcome.passed {
                format!("{PASS} PASS")
            } else {
                format!("{FAIL} FAIL")
            }
        ),
        Err(GateError::Validate(e)) => format!("- {FAIL} INVALID: {e}"),
        Err(e) => format!("- {FAIL} ERROR: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_sections_for_present_facts() {
        let engine = GateEngine::builtin();
        let mut store = engine.fact_store();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        store.assert_value("costs", "acme", 9_000.0).unwrap();
        store
            .assert_value("tech_stack", "acme", vec!["fastapi", "react"])
            .unwrap();

        let report = validation_report(&engine, &store, "acme", Some(Phase::P3)).unwrap();
        assert!(report.starts_with("# Validation Report: acme"));
        assert!(report.contains("## ROI Validation"));
        assert!(report.contains("roi: 0.11 (threshold: >= 1.5) ✗ FAIL"));
        assert!(!report.contains("## Unit Economics Validation"));
        assert!(report.contains("## Phase Gate: P2 → P3 (Week 6 - Sacred $100 decision)"));
        assert!(report.contains("- Decision: **HALT (keep $100)**"));
        assert!(report.contains("- fastapi: ✓ Approved"));
        assert!(report.contains("- react: ⚠ Reconsider"));
        assert!(report.contains("  ⚠ Consider HTMX + Alpine.js for simpler SSR"));
        assert!(report.contains("Stack needs review"));
    }

    #[test]
    fn invalid_figures_are_shown_not_hidden() {
        let engine = GateEngine::builtin();
        let mut store = engine.fact_store();
        store.assert_value("ltv", "acme", 600.0).unwrap();
        store.assert_value("cac", "acme", 0.0).unwrap();
        let report = validation_report(&engine, &store, "acme", None).unwrap();
        assert!(report.contains("## Unit Economics Validation"));
        assert!(report.contains("✗ INVALID"));
        assert!(!report.contains("## Phase Gate"));
    }
}
