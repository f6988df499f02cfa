//! The builtin phase-gate rule base (P0 → P5).

use crate::category::{
    AI_CODE_GENERATION_FRIENDLY, SIMPLER_ALTERNATIVE_CHECKED, SINGLE_COMMAND_DEPLOYABLE,
};
use crate::validate::Metric;

use super::term::{FactPredicate, GoalDefinition, Term, ValueSource};

pub const RESEARCH_COMPLETE: &str = "researchComplete";
pub const CAN_PROCEED_TO_P1: &str = "canProceedToP1";
pub const BUSINESS_MODEL_SOUND: &str = "businessModelSound";
pub const MARKET_VALIDATED: &str = "marketValidated";
pub const CAN_PROCEED_TO_P2: &str = "canProceedToP2";
pub const ASSUMPTION_VALIDATED: &str = "assumptionValidated";
pub const NO_UNVALIDATED_CLAIMS: &str = "noUnvalidatedClaims";
pub const ROI_POSITIVE: &str = "roiPositive";
pub const TIMELINE_REALISTIC: &str = "timelineRealistic";
pub const RISKS_IDENTIFIED: &str = "risksIdentified";
pub const RISKS_MITIGATED: &str = "risksMitigated";
pub const TECH_CHOICE_APPROVED: &str = "techChoiceApproved";
pub const TECH_CHOICE_RECOMMENDED: &str = "techChoiceRecommended";
pub const CAN_PROCEED_TO_P3: &str = "canProceedToP3";
pub const CAN_PROCEED_TO_P4: &str = "canProceedToP4";
pub const ACTUAL_ROI_POSITIVE: &str = "actualRoiPositive";
pub const CAN_PROCEED_TO_P5: &str = "canProceedToP5";
pub const UNIT_ECONOMICS_SOUND: &str = "unitEconomicsSound";

/// Minimum business-model score accepted in place of an explicit assessment.
const MIN_BUSINESS_MODEL_SCORE: f64 = 70.0;
const MIN_MARKET_SIZE: f64 = 1_000_000.0;
const MAX_TIMELINE_WEEKS: f64 = 52.0;

fn is_true(relation: &str) -> Term {
    Term::fact(relation, FactPredicate::IsTrue)
}

pub(super) fn definitions() -> Vec<GoalDefinition> {
    vec![
        // -- P0 -> P1 ------------------------------------------------------
        GoalDefinition::new(RESEARCH_COMPLETE)
            .describe("Research is done and a tier has been assigned")
            .clause(vec![
                is_true("research_done"),
                Term::fact("tier", FactPredicate::one_of(["t1", "t2", "t3", "t4"])),
            ]),
        GoalDefinition::new(CAN_PROCEED_TO_P1)
            .describe("P0 -> P1: research complete, tier T1 or T2")
            .clause(vec![
                Term::goal(RESEARCH_COMPLETE),
                Term::fact("tier", FactPredicate::one_of(["t1", "t2"])),
            ]),
        // -- P1 -> P2 ------------------------------------------------------
        GoalDefinition::new(BUSINESS_MODEL_SOUND)
            .describe("Business model assessed as sound, or scored high enough")
            .clause(vec![is_true("business_model_sound")])
            .clause(vec![Term::fact(
                "score",
                FactPredicate::at_least(MIN_BUSINESS_MODEL_SCORE),
            )]),
        GoalDefinition::new(MARKET_VALIDATED)
            .describe("Addressable market above one million")
            .clause(vec![Term::fact(
                "market_size",
                FactPredicate::greater_than(MIN_MARKET_SIZE),
            )]),
        GoalDefinition::new(CAN_PROCEED_TO_P2)
            .describe("P1 -> P2: business model sound, market validated, explicit go")
            .clause(vec![
                Term::goal(BUSINESS_MODEL_SOUND),
                Term::goal(MARKET_VALIDATED),
                is_true("go_decision"),
            ]),
        // -- P2 -> P3 ------------------------------------------------------
        GoalDefinition::new(ASSUMPTION_VALIDATED)
            .describe("The assumption appears in the validated list")
            .clause(vec![Term::fact(
                "validated_assumptions",
                FactPredicate::ContainsElement,
            )]),
        GoalDefinition::new(NO_UNVALIDATED_CLAIMS)
            .describe("No open unvalidated claim and every assumption validated")
            .clause(vec![
                Term::fact("unvalidated_claim", FactPredicate::Absent),
                Term::for_all("assumptions", ASSUMPTION_VALIDATED),
            ]),
        GoalDefinition::new(ROI_POSITIVE)
            .describe("Projected ROI meets the threshold")
            .clause(vec![Term::numeric(Metric::Roi)]),
        GoalDefinition::new(TIMELINE_REALISTIC)
            .describe("Timeline is positive and at most one year")
            .clause(vec![Term::fact(
                "timeline_weeks",
                FactPredicate::in_range(0.0, MAX_TIMELINE_WEEKS),
            )]),
        GoalDefinition::new(RISKS_IDENTIFIED)
            .describe("Risks flagged as identified, or at least one risk recorded")
            .clause(vec![is_true("risks_identified")])
            .clause(vec![Term::fact("risk", FactPredicate::Asserted)]),
        GoalDefinition::new(RISKS_MITIGATED)
            .describe("Risks identified and contingency plans exist")
            .clause(vec![
                Term::goal(RISKS_IDENTIFIED),
                is_true("contingency_plans"),
            ]),
        GoalDefinition::new(TECH_CHOICE_APPROVED)
            .describe("The technology is a vetted simple choice")
            .clause(vec![Term::category(
                SIMPLER_ALTERNATIVE_CHECKED,
                ValueSource::Element,
            )]),
        GoalDefinition::new(TECH_CHOICE_RECOMMENDED)
            .describe("Approved, friendly to code generation, and deployable in one command")
            .clause(vec![
                Term::goal(TECH_CHOICE_APPROVED),
                Term::category(AI_CODE_GENERATION_FRIENDLY, ValueSource::Element),
                Term::category(SINGLE_COMMAND_DEPLOYABLE, ValueSource::Element),
            ]),
        GoalDefinition::new(CAN_PROCEED_TO_P3)
            .describe("P2 -> P3: the week-six budget decision")
            .clause(vec![
                Term::goal(BUSINESS_MODEL_SOUND),
                Term::goal(NO_UNVALIDATED_CLAIMS),
                Term::goal(ROI_POSITIVE),
                Term::goal(TIMELINE_REALISTIC),
                Term::goal(RISKS_MITIGATED),
                Term::for_all("tech_stack", TECH_CHOICE_APPROVED),
            ]),
        // -- P3 -> P4 ------------------------------------------------------
        GoalDefinition::new(CAN_PROCEED_TO_P4)
            .describe("P3 -> P4: code complete, tests passing, deployment ready")
            .clause(vec![
                is_true("code_complete"),
                is_true("tests_passing"),
                is_true("deployment_ready"),
            ]),
        // -- P4 -> P5 ------------------------------------------------------
        GoalDefinition::new(ACTUAL_ROI_POSITIVE)
            .describe("Realized ROI meets the threshold")
            .clause(vec![Term::numeric_from(
                Metric::Roi,
                ["actual_revenue", "actual_costs"],
            )]),
        GoalDefinition::new(CAN_PROCEED_TO_P5)
            .describe("P4 -> P5: validation complete, sustainable, actual ROI positive")
            .clause(vec![
                is_true("validation_complete"),
                is_true("sustainability_proven"),
                Term::goal(ACTUAL_ROI_POSITIVE),
            ]),
        // -- Reporting -----------------------------------------------------
        GoalDefinition::new(UNIT_ECONOMICS_SOUND)
            .describe("LTV:CAC and payback period meet their thresholds")
            .clause(vec![
                Term::numeric(Metric::LtvCac),
                Term::numeric(Metric::PaybackMonths),
            ]),
    ]
}
