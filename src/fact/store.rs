//! Per-evaluation fact store.
//!
//! A `FactStore` is created empty for one evaluation request, populated by the
//! caller, queried, and dropped. Facts are kept in insertion order per
//! `(initiative, relation)`. Functional relations reject a second assertion
//! rather than merging it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FactError, FactResult};

use super::schema::RelationRegistry;
use super::value::Value;

/// The arguments of one fact, after the initiative key.
pub type Tuple = Vec<Value>;

/// In-memory collection of typed assertions about one or more initiatives.
#[derive(Debug, Clone)]
pub struct FactStore {
    registry: Arc<RelationRegistry>,
    /// Initiative keys in first-assertion order.
    initiatives: Vec<String>,
    facts: HashMap<String, HashMap<String, Vec<Tuple>>>,
}

impl FactStore {
    pub fn new(registry: Arc<RelationRegistry>) -> Self {
        Self {
            registry,
            initiatives: Vec::new(),
            facts: HashMap::new(),
        }
    }

    /// A store over the standard relation registry.
    pub fn standard() -> Self {
        Self::new(Arc::new(RelationRegistry::standard()))
    }

    pub fn registry(&self) -> &RelationRegistry {
        &self.registry
    }

    /// Record a fact `relation(initiative, values...)`.
    pub fn assert(
        &mut self,
        relation: &str,
        initiative: &str,
        values: Vec<Value>,
    ) -> FactResult<()> {
        let schema = self.registry.get(relation)?;
        schema.check(&values)?;

        let functional = schema.functional;
        if !self.facts.contains_key(initiative) {
            self.initiatives.push(initiative.to_string());
        }
        let tuples = self
            .facts
            .entry(initiative.to_string())
            .or_default()
            .entry(relation.to_string())
            .or_default();

        if functional && !tuples.is_empty() {
            return Err(FactError::DuplicateFunctionalFact {
                relation: relation.to_string(),
                initiative: initiative.to_string(),
            });
        }

        tracing::trace!(relation, initiative, "fact asserted");
        tuples.push(values);
        Ok(())
    }

    /// Record a single-argument fact.
    pub fn assert_value(
        &mut self,
        relation: &str,
        initiative: &str,
        value: impl Into<Value>,
    ) -> FactResult<()> {
        self.assert(relation, initiative, vec![value.into()])
    }

    /// All tuples for `relation(initiative, ...)`, in insertion order.
    pub fn lookup(&self, relation: &str, initiative: &str) -> FactResult<&[Tuple]> {
        self.registry.get(relation)?;
        Ok(self
            .facts
            .get(initiative)
            .and_then(|by_relation| by_relation.get(relation))
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// The first tuple for `relation(initiative, ...)`.
    pub fn lookup_one(&self, relation: &str, initiative: &str) -> FactResult<&Tuple> {
        self.lookup(relation, initiative)?
            .first()
            .ok_or_else(|| FactError::FactNotFound {
                relation: relation.to_string(),
                initiative: initiative.to_string(),
            })
    }

    /// The first argument of the first tuple, if any.
    pub fn first_value(&self, relation: &str, initiative: &str) -> FactResult<Option<&Value>> {
        Ok(self
            .lookup(relation, initiative)?
            .first()
            .and_then(|tuple| tuple.first()))
    }

    /// Initiative keys in first-assertion order.
    pub fn initiatives(&self) -> &[String] {
        &self.initiatives
    }

    /// Number of facts held for one initiative.
    pub fn fact_count(&self, initiative: &str) -> usize {
        self.facts
            .get(initiative)
            .map(|by_relation| by_relation.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Load facts from a JSON document of the form
    /// `{ "initiative": { "relation": value, ... }, ... }`.
    ///
    /// For a multi-valued relation a JSON array asserts one fact per element.
    /// Relations with more than one argument take an array of arguments (or an
    /// array of such arrays when multi-valued). Initiatives are recorded in
    /// document order.
    ///
    /// The load is all-or-nothing: on error the store is left as it was.
    pub fn load_json(&mut self, document: &str) -> FactResult<()> {
        let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(document)
            .map_err(|e| FactError::Document {
                message: e.to_string(),
            })?;

        let mut scratch = self.clone();
        scratch.load_document(parsed)?;
        *self = scratch;
        Ok(())
    }

    fn load_document(
        &mut self,
        parsed: serde_json::Map<String, serde_json::Value>,
    ) -> FactResult<()> {
        for (initiative, relations) in parsed {
            let serde_json::Value::Object(relations) = relations else {
                return Err(FactError::Document {
                    message: format!("initiative \"{initiative}\" must map to an object"),
                });
            };
            for (relation, raw) in relations {
                let schema = self.registry.get(&relation)?.clone();
                let tuples: Vec<serde_json::Value> = match (schema.functional, raw) {
                    (false, serde_json::Value::Array(items)) => items,
                    (_, raw) => vec![raw],
                };
                for raw in tuples {
                    let values = decode_tuple(&relation, schema.arity(), raw)?;
                    self.assert(&relation, &initiative, values)?;
                }
            }
        }
        Ok(())
    }
}

fn decode_tuple(relation: &str, arity: usize, raw: serde_json::Value) -> FactResult<Tuple> {
    let to_value = |raw: serde_json::Value| {
        serde_json::from_value::<Value>(raw).map_err(|e| FactError::Document {
            message: format!("{relation}: {e}"),
        })
    };
    if arity == 1 {
        return Ok(vec![to_value(raw)?]);
    }
    match raw {
        serde_json::Value::Array(args) => args.into_iter().map(to_value).collect(),
        other => Err(FactError::Document {
            message: format!("{relation} takes {arity} arguments, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{RelationSchema, ValueKind};

    #[test]
    fn duplicate_functional_fact_keeps_original() {
        let mut store = FactStore::standard();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();
        let err = store.assert_value("revenue", "acme", 20_000.0).unwrap_err();
        assert!(matches!(err, FactError::DuplicateFunctionalFact { .. }));
        assert_eq!(
            store.lookup_one("revenue", "acme").unwrap(),
            &vec![Value::Number(10_000.0)]
        );
        assert_eq!(store.lookup("revenue", "acme").unwrap().len(), 1);
    }

    #[test]
    fn functional_relation_is_scoped_per_initiative() {
        let mut store = FactStore::standard();
        store.assert_value("revenue", "acme", 1.0).unwrap();
        store.assert_value("revenue", "globex", 2.0).unwrap();
        assert_eq!(store.initiatives(), &["acme".to_string(), "globex".to_string()]);
    }

    #[test]
    fn multi_valued_relation_preserves_insertion_order() {
        let mut store = FactStore::standard();
        store.assert_value("risk", "acme", "churn").unwrap();
        store.assert_value("risk", "acme", "regulation").unwrap();
        store.assert_value("risk", "acme", "churn").unwrap();
        let risks: Vec<_> = store
            .lookup("risk", "acme")
            .unwrap()
            .iter()
            .map(|t| t[0].as_text().unwrap().to_string())
            .collect();
        assert_eq!(risks, vec!["churn", "regulation", "churn"]);
    }

    #[test]
    fn lookup_on_empty_store() {
        let store = FactStore::standard();
        assert!(store.lookup("revenue", "acme").unwrap().is_empty());
        assert!(matches!(
            store.lookup_one("revenue", "acme"),
            Err(FactError::FactNotFound { .. })
        ));
        assert!(matches!(
            store.lookup("velocity", "acme"),
            Err(FactError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn assert_rejects_wrong_kind_without_recording() {
        let mut store = FactStore::standard();
        assert!(store.assert_value("revenue", "acme", "lots").is_err());
        assert_eq!(store.fact_count("acme"), 0);
        assert!(store.initiatives().is_empty());
    }

    #[test]
    fn load_json_document() {
        let mut store = FactStore::standard();
        store
            .load_json(
                r#"{
                    "acme": {
                        "revenue": 10000,
                        "tier": "t1",
                        "tech_stack": ["postgres", "fastapi"],
                        "risk": ["churn", "supply"]
                    }
                }"#,
            )
            .unwrap();
        assert_eq!(
            store.first_value("tech_stack", "acme").unwrap(),
            Some(&Value::from(vec!["postgres", "fastapi"]))
        );
        assert_eq!(store.lookup("risk", "acme").unwrap().len(), 2);
        assert_eq!(store.fact_count("acme"), 5);
    }

    #[test]
    fn load_json_multi_argument_relation() {
        let mut registry = RelationRegistry::standard();
        registry.declare(RelationSchema {
            name: "milestone".into(),
            args: vec![ValueKind::Text, ValueKind::Number],
            functional: false,
        });
        let mut store = FactStore::new(Arc::new(registry));
        store
            .load_json(r#"{"acme": {"milestone": [["beta", 4], ["launch", 10]]}}"#)
            .unwrap();
        let milestones = store.lookup("milestone", "acme").unwrap();
        assert_eq!(milestones[1], vec![Value::from("launch"), Value::Number(10.0)]);
    }

    #[test]
    fn load_json_keeps_document_order() {
        let mut store = FactStore::standard();
        store
            .load_json(r#"{"zeta": {"revenue": 1}, "acme": {"revenue": 2}}"#)
            .unwrap();
        assert_eq!(store.initiatives(), &["zeta".to_string(), "acme".to_string()]);
    }

    #[test]
    fn failed_load_leaves_store_untouched() {
        let mut store = FactStore::standard();
        store.assert_value("revenue", "acme", 10_000.0).unwrap();

        let err = store
            .load_json(r#"{"globex": {"revenue": 5, "costs": "cheap"}, "acme": {"costs": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, FactError::KindMismatch { .. }));
        assert_eq!(store.initiatives(), &["acme".to_string()]);
        assert_eq!(store.fact_count("globex"), 0);
        assert_eq!(store.fact_count("acme"), 1);
    }

    #[test]
    fn load_json_rejects_non_object_initiative() {
        let mut store = FactStore::standard();
        assert!(matches!(
            store.load_json(r#"{"acme": 3}"#),
            Err(FactError::Document { .. })
        ));
    }
}
