//! Goal resolution over a fact store.
//!
//! Clauses of a goal are tried in order and the first satisfied clause wins.
//! Terms within a clause are evaluated left to right and evaluation stops at
//! the first failing term. The reported failure always comes from the first
//! clause.

use std::sync::Arc;

use rayon::prelude::*;

use crate::category::{CategoryTables, Classification, Verdict};
use crate::config::GateConfig;
use crate::error::{FactError, GateResult, RuleError, ValidateError};
use crate::fact::{FactStore, RelationRegistry, Value};
use crate::phase::{GateDecision, Phase};
use crate::rules::{FactPredicate, GoalDefinition, RuleBase, Term, ValueSource};
use crate::validate::{self, BudgetOutcome, BudgetRule, Metric, NumericOutcome, ThresholdTable};

use super::trace::{Evaluation, FailedTerm, FailureReason, TermCheck, TermStatus};

/// Bindings in effect while resolving one goal.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    initiative: &'a str,
    /// Element bound by the nearest enclosing `forall`.
    element: Option<&'a str>,
}

/// A failed term before it is attached to its goal and position.
struct TermFailure {
    reason: FailureReason,
    cause: Option<FailedTerm>,
}

impl TermFailure {
    fn leaf(reason: FailureReason) -> Self {
        Self {
            reason,
            cause: None,
        }
    }
}

type TermOutcome = GateResult<Option<TermFailure>>;

/// The decision-gate engine.
///
/// Holds the rule base, thresholds, budget rule, category tables, and relation
/// registry. All of them are immutable after construction, so one engine can
/// serve any number of concurrent evaluations.
#[derive(Debug, Clone)]
pub struct GateEngine {
    rules: Arc<RuleBase>,
    thresholds: Arc<ThresholdTable>,
    budget: BudgetRule,
    categories: Arc<CategoryTables>,
    relations: Arc<RelationRegistry>,
}

impl GateEngine {
    /// Engine with the builtin rule base, tables, and default thresholds.
    pub fn builtin() -> Self {
        Self {
            rules: Arc::new(RuleBase::builtin()),
            thresholds: Arc::new(ThresholdTable::default()),
            budget: BudgetRule::default(),
            categories: Arc::new(CategoryTables::builtin()),
            relations: Arc::new(RelationRegistry::standard()),
        }
    }

    /// Build an engine from configuration.
    ///
    /// Starts from the builtin components and applies the configured
    /// thresholds, budget cap, extra relations, category axes, and rule file.
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        config.validate()?;

        let mut relations = RelationRegistry::standard();
        for schema in &config.relations {
            relations.declare(schema.clone());
        }

        let mut categories = CategoryTables::builtin();
        for table in &config.categories {
            categories.upsert(table.clone());
        }

        let mut rules = RuleBase::builtin();
        if let Some(path) = &config.rules {
            rules = rules.extend(RuleBase::load_definitions(path)?)?;
        }

        let engine = Self {
            rules: Arc::new(rules),
            thresholds: Arc::new(config.thresholds.clone()),
            budget: BudgetRule::new(config.budget_cap),
            categories: Arc::new(categories),
            relations: Arc::new(relations),
        };
        engine.check_references()?;

        tracing::info!(
            goals = engine.rules.goals().len(),
            axes = engine.categories.iter().count(),
            relations = engine.relations.len(),
            "gate engine initialized"
        );
        Ok(engine)
    }

    pub fn with_rules(mut self, rules: RuleBase) -> GateResult<Self> {
        self.rules = Arc::new(rules);
        self.check_references()?;
        Ok(self)
    }

    pub fn with_categories(mut self, categories: CategoryTables) -> GateResult<Self> {
        self.categories = Arc::new(categories);
        self.check_references()?;
        Ok(self)
    }

    pub fn with_relations(mut self, relations: RelationRegistry) -> GateResult<Self> {
        self.relations = Arc::new(relations);
        self.check_references()?;
        Ok(self)
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = Arc::new(thresholds);
        self
    }

    pub fn with_budget(mut self, budget: BudgetRule) -> Self {
        self.budget = budget;
        self
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    pub fn categories(&self) -> &CategoryTables {
        &self.categories
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub fn budget(&self) -> BudgetRule {
        self.budget
    }

    /// An empty fact store over this engine's relation registry.
    pub fn fact_store(&self) -> FactStore {
        FactStore::new(Arc::clone(&self.relations))
    }

    /// Every relation and axis a rule mentions must be known.
    fn check_references(&self) -> GateResult<()> {
        for goal in self.rules.goals() {
            for term in goal.terms() {
                for relation in term.relations() {
                    if !self.relations.contains(relation) {
                        return Err(RuleError::UnknownRelation {
                            goal: goal.name.clone(),
                            relation: relation.to_string(),
                        }
                        .into());
                    }
                }
                if let Term::Category { axis, .. } = term {
                    if !self.categories.contains(axis) {
                        return Err(RuleError::UnknownAxis {
                            goal: goal.name.clone(),
                            axis: axis.clone(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Decide whether `goal` holds for `initiative`.
    ///
    /// Non-satisfaction is reported in the [`Evaluation`]; errors are reserved
    /// for unknown names and invalid numeric input.
    pub fn evaluate_goal(
        &self,
        store: &FactStore,
        goal: &str,
        initiative: &str,
    ) -> GateResult<Evaluation> {
        self.evaluate_scoped(store, goal, initiative, None)
    }

    /// Evaluate a goal with an element bound, as a `forall` would.
    pub fn evaluate_for_element(
        &self,
        store: &FactStore,
        goal: &str,
        initiative: &str,
        element: &str,
    ) -> GateResult<Evaluation> {
        self.evaluate_scoped(store, goal, initiative, Some(element))
    }

    fn evaluate_scoped(
        &self,
        store: &FactStore,
        goal: &str,
        initiative: &str,
        element: Option<&str>,
    ) -> GateResult<Evaluation> {
        let scope = Scope {
            initiative,
            element,
        };
        let failure = self.resolve_goal(store, goal, scope)?;
        match &failure {
            None => tracing::debug!(goal, initiative, "goal satisfied"),
            Some(f) => tracing::debug!(
                goal,
                initiative,
                root = %f.root_cause(),
                "goal not satisfied"
            ),
        }
        Ok(Evaluation::new(goal, initiative, failure))
    }

    /// Evaluate whether `initiative` may enter `target`.
    pub fn evaluate_gate(
        &self,
        store: &FactStore,
        target: Phase,
        initiative: &str,
    ) -> GateResult<GateDecision> {
        let (Some(from), Some(goal)) = (target.previous(), target.gate_goal()) else {
            return Err(RuleError::NoGate {
                phase: target.to_string(),
            }
            .into());
        };
        let evaluation = self.evaluate_goal(store, goal, initiative)?;
        let decision = GateDecision::new(from, target, evaluation);
        tracing::info!(
            initiative,
            from = %from,
            to = %target,
            proceed = decision.proceed(),
            "gate decision"
        );
        Ok(decision)
    }

    /// Evaluate one goal for many independent fact stores in parallel.
    ///
    /// Results come back in input order.
    pub fn evaluate_batch(
        &self,
        goal: &str,
        requests: &[(&FactStore, &str)],
    ) -> Vec<GateResult<Evaluation>> {
        requests
            .par_iter()
            .map(|(store, initiative)| self.evaluate_goal(store, goal, initiative))
            .collect()
    }

    /// Check every term of the goal's first clause independently.
    ///
    /// Unlike [`evaluate_goal`](Self::evaluate_goal) this does not stop at the
    /// first failure, and errors are recorded per term instead of returned.
    /// Meant for reports, not for gate decisions.
    pub fn checklist(
        &self,
        store: &FactStore,
        goal: &str,
        initiative: &str,
    ) -> GateResult<Vec<TermCheck>> {
        let def = self.rules.get(goal)?;
        let Some(clause) = def.clauses.first() else {
            return Ok(Vec::new());
        };
        let scope = Scope {
            initiative,
            element: None,
        };
        Ok(clause
            .terms
            .iter()
            .enumerate()
            .map(|(index, term)| {
                let status = match self.check_term(store, def, term, scope) {
                    Ok(None) => TermStatus::Passed,
                    Ok(Some(failure)) => TermStatus::Failed {
                        failure: attach(def, 0, index, term, failure),
                    },
                    Err(e) => TermStatus::Error {
                        message: e.to_string(),
                    },
                };
                TermCheck {
                    term: term.to_string(),
                    status,
                }
            })
            .collect())
    }

    fn resolve_goal(
        &self,
        store: &FactStore,
        name: &str,
        scope: Scope<'_>,
    ) -> GateResult<Option<FailedTerm>> {
        let def = self.rules.get(name)?;
        let mut first_failure = None;

        'clauses: for (clause_index, clause) in def.clauses.iter().enumerate() {
            for (term_index, term) in clause.terms.iter().enumerate() {
                if let Some(failure) = self.check_term(store, def, term, scope)? {
                    if first_failure.is_none() {
                        first_failure = Some(attach(def, clause_index, term_index, term, failure));
                    }
                    continue 'clauses;
                }
            }
            tracing::trace!(goal = name, clause = clause_index, "clause satisfied");
            return Ok(None);
        }
        Ok(first_failure)
    }

    fn check_term(
        &self,
        store: &FactStore,
        def: &GoalDefinition,
        term: &Term,
        scope: Scope<'_>,
    ) -> TermOutcome {
        match term {
            Term::Fact {
                relation,
                predicate,
            } => self.check_fact(store, def, relation, predicate, scope),
            Term::Numeric { metric, inputs } => self.check_numeric(store, *metric, inputs, scope),
            Term::Category { axis, value } => self.check_category(store, def, axis, value, scope),
            Term::Goal { name } => Ok(self.resolve_goal(store, name, scope)?.map(|cause| {
                TermFailure {
                    reason: FailureReason::SubGoalFailed { goal: name.clone() },
                    cause: Some(cause),
                }
            })),
            Term::ForAll { collection, goal } => {
                self.check_for_all(store, collection, goal, scope)
            }
        }
    }

    fn check_fact(
        &self,
        store: &FactStore,
        def: &GoalDefinition,
        relation: &str,
        predicate: &FactPredicate,
        scope: Scope<'_>,
    ) -> TermOutcome {
        let tuples = store.lookup(relation, scope.initiative)?;
        let missing = || {
            TermFailure::leaf(FailureReason::MissingFact {
                relation: relation.to_string(),
            })
        };

        // A relation may carry no arguments beyond the initiative.
        if predicate.tests_presence_only() {
            return Ok(match (predicate, tuples.first()) {
                (FactPredicate::Absent, Some(tuple)) => {
                    Some(TermFailure::leaf(FailureReason::PredicateFailed {
                        relation: relation.to_string(),
                        actual: tuple.first().cloned().unwrap_or(Value::Bool(true)),
                    }))
                }
                (FactPredicate::Asserted, None) => Some(missing()),
                _ => None,
            });
        }

        let Some(actual) = tuples.first().and_then(|t| t.first()) else {
            return Ok(Some(missing()));
        };
        if predicate_holds(def, predicate, actual, scope)? {
            Ok(None)
        } else {
            Ok(Some(TermFailure::leaf(FailureReason::PredicateFailed {
                relation: relation.to_string(),
                actual: actual.clone(),
            })))
        }
    }

    fn check_numeric(
        &self,
        store: &FactStore,
        metric: Metric,
        inputs: &[String],
        scope: Scope<'_>,
    ) -> TermOutcome {
        let mut figures = Vec::with_capacity(inputs.len());
        for relation in inputs {
            let Some(value) = store.first_value(relation, scope.initiative)? else {
                return Ok(Some(TermFailure::leaf(FailureReason::MissingFact {
                    relation: relation.clone(),
                })));
            };
            let figure = value.as_number().ok_or_else(|| ValidateError::InvalidInput {
                metric: metric.name().to_string(),
                message: format!("{relation} is {value}, not a number"),
            })?;
            figures.push(figure);
        }

        let outcome = validate::validate(metric, &figures, &self.thresholds)?;
        if outcome.passed {
            Ok(None)
        } else {
            Ok(Some(TermFailure::leaf(FailureReason::ThresholdNotMet {
                outcome,
            })))
        }
    }

    fn check_category(
        &self,
        store: &FactStore,
        def: &GoalDefinition,
        axis: &str,
        source: &ValueSource,
        scope: Scope<'_>,
    ) -> TermOutcome {
        let value = match source {
            ValueSource::Element => scope.element.ok_or_else(|| RuleError::UnboundElement {
                goal: def.name.clone(),
            })?,
            ValueSource::Literal(value) => value.as_str(),
            ValueSource::Fact(relation) => match store.first_value(relation, scope.initiative)? {
                Some(Value::Text(text)) => text.as_str(),
                Some(other) => {
                    return Ok(Some(TermFailure::leaf(FailureReason::PredicateFailed {
                        relation: relation.clone(),
                        actual: other.clone(),
                    })));
                }
                None => {
                    return Ok(Some(TermFailure::leaf(FailureReason::MissingFact {
                        relation: relation.clone(),
                    })));
                }
            },
        };

        let classification = self.categories.explain(axis, value)?;
        match classification.verdict {
            Verdict::Accepted => Ok(None),
            verdict => {
                tracing::warn!(
                    initiative = scope.initiative,
                    axis,
                    value = %classification.value,
                    %verdict,
                    advice = classification.advice.as_deref().unwrap_or(""),
                    "categorical check not accepted"
                );
                Ok(Some(TermFailure::leaf(FailureReason::Verdict {
                    classification,
                })))
            }
        }
    }

    fn check_for_all(
        &self,
        store: &FactStore,
        collection: &str,
        goal: &str,
        scope: Scope<'_>,
    ) -> TermOutcome {
        for element in collection_elements(store, collection, scope.initiative)? {
            let inner = Scope {
                initiative: scope.initiative,
                element: Some(element),
            };
            if let Some(cause) = self.resolve_goal(store, goal, inner)? {
                return Ok(Some(TermFailure {
                    reason: FailureReason::ElementFailed {
                        element: element.to_string(),
                        goal: goal.to_string(),
                    },
                    cause: Some(cause),
                }));
            }
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Direct checks
    // -----------------------------------------------------------------------

    /// Run a numeric validator by name.
    pub fn validate_numeric(&self, name: &str, inputs: &[f64]) -> GateResult<NumericOutcome> {
        let metric = Metric::parse(name)?;
        Ok(validate::validate(metric, inputs, &self.thresholds)?)
    }

    pub fn classify(&self, axis: &str, value: &str) -> GateResult<Verdict> {
        Ok(self.categories.classify(axis, value)?)
    }

    /// Classification with advice and whether an entry matched.
    pub fn explain(&self, axis: &str, value: &str) -> GateResult<Classification> {
        Ok(self.categories.explain(axis, value)?)
    }

    /// Apply the budget rule for the given phase.
    pub fn check_budget(&self, phase: Phase, spent: f64, profit: f64) -> GateResult<BudgetOutcome> {
        Ok(self.budget.check(phase.budget_stage(), spent, profit)?)
    }
}

fn attach(
    def: &GoalDefinition,
    clause: usize,
    term_index: usize,
    term: &Term,
    failure: TermFailure,
) -> FailedTerm {
    FailedTerm {
        goal: def.name.clone(),
        clause,
        term_index,
        term: term.to_string(),
        reason: failure.reason,
        cause: failure.cause.map(Box::new),
    }
}

fn predicate_holds(
    def: &GoalDefinition,
    predicate: &FactPredicate,
    actual: &Value,
    scope: Scope<'_>,
) -> GateResult<bool> {
    let number = actual.as_number();
    Ok(match predicate {
        FactPredicate::Asserted => true,
        FactPredicate::Absent => false,
        FactPredicate::IsTrue => actual.as_bool() == Some(true),
        FactPredicate::AtLeast { value } => number.is_some_and(|n| n >= *value),
        FactPredicate::GreaterThan { value } => number.is_some_and(|n| n > *value),
        FactPredicate::InRange { above, up_to } => {
            number.is_some_and(|n| n > *above && n <= *up_to)
        }
        FactPredicate::OneOf { values } => actual
            .as_text()
            .map(str::trim)
            .is_some_and(|t| values.iter().any(|v| v.eq_ignore_ascii_case(t))),
        FactPredicate::ContainsElement => {
            let element = scope.element.ok_or_else(|| RuleError::UnboundElement {
                goal: def.name.clone(),
            })?;
            actual
                .as_list()
                .is_some_and(|items| items.iter().any(|item| item == element))
        }
    })
}

/// Elements of a collection relation: the items of list facts and the text of
/// text facts, in insertion order. A missing collection has no elements.
fn collection_elements<'s>(
    store: &'s FactStore,
    collection: &str,
    initiative: &str,
) -> GateResult<Vec<&'s str>> {
    let mut elements = Vec::new();
    for tuple in store.lookup(collection, initiative)? {
        match tuple.first() {
            Some(Value::List(items)) => elements.extend(items.iter().map(String::as_str)),
            Some(Value::Text(text)) => elements.push(text.as_str()),
            Some(other) => {
                return Err(FactError::KindMismatch {
                    relation: collection.to_string(),
                    position: 0,
                    expected: "list or text".to_string(),
                    actual: other.kind().to_string(),
                }
                .into());
            }
            None => {}
        }
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::*;

    fn p3_ready() -> FactStore {
        let mut store = FactStore::standard();
        store.assert_value("business_model_sound", "acme", true).unwrap();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        store.assert_value("costs", "acme", 2_000.0).unwrap();
        store.assert_value("timeline_weeks", "acme", 8.0).unwrap();
        store.assert_value("risks_identified", "acme", true).unwrap();
        store.assert_value("contingency_plans", "acme", true).unwrap();
        store
            .assert_value("tech_stack", "acme", vec!["fastapi", "postgres"])
            .unwrap();
        store
    }

    #[test]
    fn p3_gate_passes_with_complete_facts() {
        let engine = GateEngine::builtin();
        let eval = engine
            .evaluate_goal(&p3_ready(), CAN_PROCEED_TO_P3, "acme")
            .unwrap();
        assert!(eval.satisfied, "{:?}", eval.failing_term);
        assert!(eval.failing_term.is_none());
    }

    #[test]
    fn failing_roi_is_the_root_cause() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("business_model_sound", "acme", true).unwrap();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        store.assert_value("costs", "acme", 9_000.0).unwrap();

        let eval = engine
            .evaluate_goal(&store, CAN_PROCEED_TO_P3, "acme")
            .unwrap();
        assert!(!eval.satisfied);
        let top = eval.failing_term.as_ref().unwrap();
        assert_eq!(top.term, "goal(roiPositive)");
        let root = top.root_cause();
        assert_eq!(root.goal, ROI_POSITIVE);
        assert!(matches!(
            &root.reason,
            FailureReason::ThresholdNotMet { outcome } if outcome.metric == Metric::Roi
        ));
    }

    #[test]
    fn later_clause_rescues_goal() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("score", "acme", 75.0).unwrap();
        let eval = engine
            .evaluate_goal(&store, BUSINESS_MODEL_SOUND, "acme")
            .unwrap();
        assert!(eval.satisfied);
    }

    #[test]
    fn failure_is_reported_from_first_clause() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("score", "acme", 40.0).unwrap();
        let failure = engine
            .evaluate_goal(&store, BUSINESS_MODEL_SOUND, "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(failure.clause, 0);
        assert_eq!(
            failure.reason,
            FailureReason::MissingFact {
                relation: "business_model_sound".into()
            }
        );
    }

    #[test]
    fn forall_over_missing_collection_is_vacuous() {
        let engine = GateEngine::builtin();
        let store = FactStore::standard();
        let eval = engine
            .evaluate_goal(&store, NO_UNVALIDATED_CLAIMS, "acme")
            .unwrap();
        assert!(eval.satisfied);
    }

    #[test]
    fn forall_reports_failing_element() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store
            .assert_value("assumptions", "acme", vec!["pricing", "channel"])
            .unwrap();
        store
            .assert_value("validated_assumptions", "acme", vec!["pricing"])
            .unwrap();
        let failure = engine
            .evaluate_goal(&store, NO_UNVALIDATED_CLAIMS, "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(
            failure.reason,
            FailureReason::ElementFailed {
                element: "channel".into(),
                goal: ASSUMPTION_VALIDATED.into()
            }
        );
    }

    #[test]
    fn unvalidated_claim_blocks() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store
            .assert_value("unvalidated_claim", "acme", "10x faster")
            .unwrap();
        let failure = engine
            .evaluate_goal(&store, NO_UNVALIDATED_CLAIMS, "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(failure.term_index, 0);
        assert!(matches!(failure.reason, FailureReason::PredicateFailed { .. }));
    }

    #[test]
    fn invalid_numeric_input_is_an_error() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        store.assert_value("costs", "acme", 0.0).unwrap();
        let result = engine.evaluate_goal(&store, ROI_POSITIVE, "acme");
        assert!(matches!(
            result,
            Err(crate::error::GateError::Validate(ValidateError::InvalidInput { .. }))
        ));
    }

    #[test]
    fn missing_numeric_input_fails_without_error() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        let failure = engine
            .evaluate_goal(&store, ROI_POSITIVE, "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(
            failure.reason,
            FailureReason::MissingFact {
                relation: "costs".into()
            }
        );
    }

    #[test]
    fn needs_review_is_a_soft_failure() {
        let engine = GateEngine::builtin();
        let eval = engine
            .evaluate_for_element(&FactStore::standard(), TECH_CHOICE_APPROVED, "acme", "elixir")
            .unwrap();
        assert!(!eval.satisfied);
        let root = eval.root_cause().unwrap();
        assert!(matches!(
            &root.reason,
            FailureReason::Verdict { classification } if classification.verdict == Verdict::NeedsReview
        ));
    }

    #[test]
    fn element_outside_forall_is_an_error() {
        let engine = GateEngine::builtin();
        let result = engine.evaluate_goal(&FactStore::standard(), TECH_CHOICE_APPROVED, "acme");
        assert!(matches!(
            result,
            Err(crate::error::GateError::Rule(RuleError::UnboundElement { .. }))
        ));
    }

    #[test]
    fn unknown_goal_is_an_error() {
        let engine = GateEngine::builtin();
        assert!(matches!(
            engine.evaluate_goal(&FactStore::standard(), "canProceedToP9", "acme"),
            Err(crate::error::GateError::Rule(RuleError::UnknownGoal { .. }))
        ));
    }

    #[test]
    fn rules_referencing_unknown_axis_are_rejected() {
        let rules = RuleBase::new(vec![
            GoalDefinition::new("g").clause(vec![Term::category(
                "color",
                ValueSource::Literal("red".into()),
            )]),
        ])
        .unwrap();
        assert!(matches!(
            GateEngine::builtin().with_rules(rules),
            Err(crate::error::GateError::Rule(RuleError::UnknownAxis { .. }))
        ));
    }

    #[test]
    fn checklist_does_not_short_circuit() {
        let engine = GateEngine::builtin();
        let mut store = FactStore::standard();
        store.assert_value("code_complete", "acme", true).unwrap();
        store.assert_value("deployment_ready", "acme", true).unwrap();
        let checks = engine.checklist(&store, CAN_PROCEED_TO_P4, "acme").unwrap();
        let passed: Vec<bool> = checks.iter().map(TermCheck::passed).collect();
        assert_eq!(passed, vec![true, false, true]);
    }

    #[test]
    fn batch_preserves_order() {
        let engine = GateEngine::builtin();
        let ready = p3_ready();
        let empty = engine.fact_store();
        let results = engine.evaluate_batch(CAN_PROCEED_TO_P3, &[(&ready, "acme"), (&empty, "acme")]);
        let satisfied: Vec<bool> = results
            .into_iter()
            .map(|r| r.unwrap().satisfied)
            .collect();
        assert_eq!(satisfied, vec![true, false]);
    }

    fn launch_engine() -> GateEngine {
        let mut relations = RelationRegistry::standard();
        relations.declare(crate::fact::RelationSchema {
            name: "launched".into(),
            args: vec![],
            functional: true,
        });
        let rules = RuleBase::new(vec![
            GoalDefinition::new("isLaunched")
                .clause(vec![Term::fact("launched", FactPredicate::Asserted)]),
            GoalDefinition::new("notLaunched")
                .clause(vec![Term::fact("launched", FactPredicate::Absent)]),
        ])
        .unwrap();
        GateEngine::builtin()
            .with_relations(relations)
            .unwrap()
            .with_rules(rules)
            .unwrap()
    }

    #[test]
    fn zero_argument_fact_counts_as_present() {
        let engine = launch_engine();
        let mut store = engine.fact_store();
        store.assert("launched", "acme", vec![]).unwrap();

        let launched = engine.evaluate_goal(&store, "isLaunched", "acme").unwrap();
        assert!(launched.satisfied, "{:?}", launched.failing_term);

        let failure = engine
            .evaluate_goal(&store, "notLaunched", "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert!(matches!(
            failure.reason,
            FailureReason::PredicateFailed { ref relation, .. } if relation == "launched"
        ));
    }

    #[test]
    fn zero_argument_fact_missing() {
        let engine = launch_engine();
        let store = engine.fact_store();
        assert!(engine.evaluate_goal(&store, "notLaunched", "acme").unwrap().satisfied);
        let failure = engine
            .evaluate_goal(&store, "isLaunched", "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(
            failure.reason,
            FailureReason::MissingFact {
                relation: "launched".into()
            }
        );
    }

    #[test]
    fn category_fact_of_wrong_kind_reports_actual_value() {
        let rules = RuleBase::new(vec![GoalDefinition::new("stackIsSimple").clause(vec![
            Term::category(
                "simpler-alternative-checked",
                ValueSource::Fact("business_model_sound".into()),
            ),
        ])])
        .unwrap();
        let engine = GateEngine::builtin().with_rules(rules).unwrap();
        let mut store = engine.fact_store();
        store.assert_value("business_model_sound", "acme", true).unwrap();

        let failure = engine
            .evaluate_goal(&store, "stackIsSimple", "acme")
            .unwrap()
            .failing_term
            .unwrap();
        assert_eq!(
            failure.reason,
            FailureReason::PredicateFailed {
                relation: "business_model_sound".into(),
                actual: Value::Bool(true),
            }
        );
    }

    #[test]
    fn budget_stage_follows_phase() {
        let engine = GateEngine::builtin();
        assert!(engine.check_budget(Phase::P1, 80.0, 0.0).unwrap().passed);
        assert!(!engine.check_budget(Phase::P3, 80.0, 50.0).unwrap().passed);
        assert!(engine.check_budget(Phase::P3, 80.0, 150.0).unwrap().passed);
    }
}
