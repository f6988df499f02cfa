//! Relation schemas: the fixed arity, argument kinds, and functionality of
//! every relation a fact store accepts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FactError, FactResult};

use super::value::{Value, ValueKind};

/// Declaration of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub name: String,
    /// Argument kinds after the initiative key. Arity is `args.len()`.
    pub args: Vec<ValueKind>,
    /// At most one fact per initiative.
    pub functional: bool,
}

impl RelationSchema {
    /// A functional relation with a single argument of the given kind.
    pub fn functional(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            args: vec![kind],
            functional: true,
        }
    }

    /// A multi-valued relation with a single argument of the given kind.
    pub fn multi(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            args: vec![kind],
            functional: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Check a tuple against this schema.
    pub fn check(&self, values: &[Value]) -> FactResult<()> {
        if values.len() != self.args.len() {
            return Err(FactError::ArityMismatch {
                relation: self.name.clone(),
                expected: self.args.len(),
                actual: values.len(),
            });
        }
        for (position, (value, expected)) in values.iter().zip(&self.args).enumerate() {
            if value.kind() != *expected {
                return Err(FactError::KindMismatch {
                    relation: self.name.clone(),
                    position,
                    expected: expected.to_string(),
                    actual: value.kind().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// The set of declared relations, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    schemas: Vec<RelationSchema>,
    index: HashMap<String, usize>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relations consumed by the builtin phase-gate rule base.
    pub fn standard() -> Self {
        use ValueKind::{Bool, List, Number, Text};

        let mut registry = Self::new();
        let schemas = [
            // P0 -> P1
            RelationSchema::functional("research_done", Bool),
            RelationSchema::functional("tier", Text),
            // P1 -> P2
            RelationSchema::functional("business_model_sound", Bool),
            RelationSchema::functional("score", Number),
            RelationSchema::functional("market_size", Number),
            RelationSchema::functional("go_decision", Bool),
            // P2 -> P3
            RelationSchema::functional("revenue", Number),
            RelationSchema::functional("costs", Number),
            RelationSchema::multi("unvalidated_claim", Text),
            RelationSchema::functional("assumptions", List),
            RelationSchema::functional("validated_assumptions", List),
            RelationSchema::functional("timeline_weeks", Number),
            RelationSchema::functional("risks_identified", Bool),
            RelationSchema::multi("risk", Text),
            RelationSchema::functional("contingency_plans", Bool),
            RelationSchema::functional("tech_stack", List),
            // P3 -> P4
            RelationSchema::functional("code_complete", Bool),
            RelationSchema::functional("tests_passing", Bool),
            RelationSchema::functional("deployment_ready", Bool),
            // P4 -> P5
            RelationSchema::functional("validation_complete", Bool),
            RelationSchema::functional("sustainability_proven", Bool),
            RelationSchema::functional("actual_revenue", Number),
            RelationSchema::functional("actual_costs", Number),
            // Unit economics and budget
            RelationSchema::functional("ltv", Number),
            RelationSchema::functional("cac", Number),
            RelationSchema::functional("monthly_revenue_per_customer", Number),
            RelationSchema::functional("spent", Number),
            RelationSchema::functional("profit", Number),
        ];
        for schema in schemas {
            registry.declare(schema);
        }
        registry
    }

    /// Declare a relation, replacing any earlier schema with the same name.
    pub fn declare(&mut self, schema: RelationSchema) {
        match self.index.get(&schema.name) {
            Some(&i) => self.schemas[i] = schema,
            None => {
                self.index.insert(schema.name.clone(), self.schemas.len());
                self.schemas.push(schema);
            }
        }
    }

    pub fn get(&self, relation: &str) -> FactResult<&RelationSchema> {
        self.index
            .get(relation)
            .map(|&i| &self.schemas[i])
            .ok_or_else(|| FactError::UnknownRelation {
                relation: relation.to_string(),
            })
    }

    pub fn contains(&self, relation: &str) -> bool {
        self.index.contains_key(relation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_declares_gate_relations() {
        let registry = RelationRegistry::standard();
        assert!(registry.get("revenue").unwrap().functional);
        assert!(!registry.get("risk").unwrap().functional);
        assert_eq!(registry.get("tech_stack").unwrap().args, vec![ValueKind::List]);
        assert!(registry.get("nonsense").is_err());
    }

    #[test]
    fn schema_check_reports_arity_and_kind() {
        let schema = RelationSchema::functional("revenue", ValueKind::Number);
        assert!(schema.check(&[Value::Number(1.0)]).is_ok());
        assert!(matches!(
            schema.check(&[]),
            Err(FactError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            schema.check(&[Value::Text("x".into())]),
            Err(FactError::KindMismatch { position: 0, .. })
        ));
    }

    #[test]
    fn declare_replaces_existing_schema_in_place() {
        let mut registry = RelationRegistry::new();
        registry.declare(RelationSchema::functional("a", ValueKind::Bool));
        registry.declare(RelationSchema::functional("b", ValueKind::Bool));
        registry.declare(RelationSchema::multi("a", ValueKind::Text));
        let names: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!registry.get("a").unwrap().functional);
    }
}
