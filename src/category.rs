//! Categorical matchers: ordered, first-match-wins classification tables.
//!
//! Each axis is an ordered list of `(value, verdict)` entries plus a default
//! verdict for unlisted values. Lookup walks the list in order and stops at the
//! first equal entry, so reordering entries changes meaning. Unlisted values
//! always resolve to the axis default; they never error.
//!
//! Defaults differ per axis: `simpler-alternative-checked` sends unknown
//! technologies to review, while the other two builtin axes let them pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CategoryError, CategoryResult};

pub const SIMPLER_ALTERNATIVE_CHECKED: &str = "simpler-alternative-checked";
pub const AI_CODE_GENERATION_FRIENDLY: &str = "ai-code-generation-friendly";
pub const SINGLE_COMMAND_DEPLOYABLE: &str = "single-command-deployable";

/// Outcome of a categorical lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected,
    /// Soft failure: the check does not pass, but callers may choose to only flag it.
    NeedsReview,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::NeedsReview => "needs review",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub value: String,
    pub verdict: Verdict,
    /// Suggested alternative, shown when the verdict is not `Accepted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl CategoryEntry {
    pub fn new(value: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            value: normalize(&value.into()),
            verdict,
            advice: None,
        }
    }

    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice = Some(advice.into());
        self
    }
}

/// Result of a lookup, including whether an entry matched or the default applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub axis: String,
    pub value: String,
    pub verdict: Verdict,
    pub advice: Option<String>,
    /// `false` when the axis default was used.
    pub matched: bool,
}

/// One classification axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub axis: String,
    pub entries: Vec<CategoryEntry>,
    pub default: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_advice: Option<String>,
}

impl CategoryTable {
    pub fn new(axis: impl Into<String>, default: Verdict) -> Self {
        Self {
            axis: axis.into(),
            entries: Vec::new(),
            default,
            default_advice: None,
        }
    }

    pub fn entry(mut self, entry: CategoryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append entries with the same verdict, keeping their order.
    pub fn entries<'a>(mut self, values: impl IntoIterator<Item = &'a str>, verdict: Verdict) -> Self {
        self.entries
            .extend(values.into_iter().map(|v| CategoryEntry::new(v, verdict)));
        self
    }

    pub fn with_default_advice(mut self, advice: impl Into<String>) -> Self {
        self.default_advice = Some(advice.into());
        self
    }

    pub fn classify(&self, value: &str) -> Classification {
        let needle = normalize(value);
        // Entries loaded from config are not normalized on the way in.
        match self.entries.iter().find(|e| normalize(&e.value) == needle) {
            Some(entry) => Classification {
                axis: self.axis.clone(),
                value: needle,
                verdict: entry.verdict,
                advice: entry.advice.clone(),
                matched: true,
            },
            None => Classification {
                axis: self.axis.clone(),
                value: needle,
                verdict: self.default,
                advice: self.default_advice.clone(),
                matched: false,
            },
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// The ordered set of axes an engine knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTables {
    tables: Vec<CategoryTable>,
}

impl CategoryTables {
    pub fn new(tables: Vec<CategoryTable>) -> CategoryResult<Self> {
        for (i, table) in tables.iter().enumerate() {
            if tables[..i].iter().any(|t| t.axis == table.axis) {
                return Err(CategoryError::DuplicateAxis {
                    axis: table.axis.clone(),
                });
            }
        }
        Ok(Self { tables })
    }

    /// The technology-choice axes.
    pub fn builtin() -> Self {
        use Verdict::{Accepted, NeedsReview, Rejected};

        let simpler = CategoryTable::new(SIMPLER_ALTERNATIVE_CHECKED, NeedsReview)
            .entries(
                [
                    "fastapi", "flask", "go", "htmx", "alpine", "tailwind", "postgres", "sqlite",
                ],
                Accepted,
            )
            .entry(
                CategoryEntry::new("react", Rejected)
                    .with_advice("Consider HTMX + Alpine.js for simpler SSR"),
            )
            .entry(CategoryEntry::new("angular", Rejected).with_advice("Consider HTMX or plain JS"))
            .entry(
                CategoryEntry::new("kubernetes", Rejected)
                    .with_advice("Consider Fly.io or Heroku unless 10K+ users"),
            )
            .entry(
                CategoryEntry::new("microservices", Rejected)
                    .with_advice("Start with monolith, split later"),
            )
            .entry(
                CategoryEntry::new("mongodb", Rejected)
                    .with_advice("Use PostgreSQL unless specific need validated"),
            )
            .with_default_advice("No simpler alternative on record; review before committing");

        let ai_friendly = CategoryTable::new(AI_CODE_GENERATION_FRIENDLY, Accepted)
            .entries(["react", "angular", "vue", "django"], Rejected);

        let deployable = CategoryTable::new(SINGLE_COMMAND_DEPLOYABLE, Accepted)
            .entries(["kubernetes", "k8s", "docker-compose"], Rejected);

        Self {
            tables: vec![simpler, ai_friendly, deployable],
        }
    }

    pub fn get(&self, axis: &str) -> CategoryResult<&CategoryTable> {
        self.tables
            .iter()
            .find(|t| t.axis == axis)
            .ok_or_else(|| CategoryError::UnknownAxis {
                axis: axis.to_string(),
            })
    }

    pub fn contains(&self, axis: &str) -> bool {
        self.tables.iter().any(|t| t.axis == axis)
    }

    pub fn classify(&self, axis: &str, value: &str) -> CategoryResult<Verdict> {
        Ok(self.get(axis)?.classify(value).verdict)
    }

    /// Like [`classify`](Self::classify), with advice and match details.
    pub fn explain(&self, axis: &str, value: &str) -> CategoryResult<Classification> {
        Ok(self.get(axis)?.classify(value))
    }

    /// Add or replace an axis. A replaced axis keeps its position.
    pub fn upsert(&mut self, table: CategoryTable) {
        match self.tables.iter_mut().find(|t| t.axis == table.axis) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTable> {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_stack_is_accepted() {
        let tables = CategoryTables::builtin();
        assert_eq!(
            tables.classify(SIMPLER_ALTERNATIVE_CHECKED, "fastapi").unwrap(),
            Verdict::Accepted
        );
        assert_eq!(
            tables.classify(SIMPLER_ALTERNATIVE_CHECKED, "  Postgres ").unwrap(),
            Verdict::Accepted
        );
    }

    #[test]
    fn unlisted_value_falls_through_to_axis_default() {
        let tables = CategoryTables::builtin();
        assert_eq!(
            tables
                .classify(SIMPLER_ALTERNATIVE_CHECKED, "some-unlisted-tool")
                .unwrap(),
            Verdict::NeedsReview
        );
        assert_eq!(
            tables
                .classify(AI_CODE_GENERATION_FRIENDLY, "some-unlisted-tool")
                .unwrap(),
            Verdict::Accepted
        );
        assert_eq!(
            tables
                .classify(SINGLE_COMMAND_DEPLOYABLE, "some-unlisted-tool")
                .unwrap(),
            Verdict::Accepted
        );
    }

    #[test]
    fn rejected_entry_carries_advice() {
        let tables = CategoryTables::builtin();
        let c = tables.explain(SIMPLER_ALTERNATIVE_CHECKED, "mongodb").unwrap();
        assert_eq!(c.verdict, Verdict::Rejected);
        assert!(c.matched);
        assert_eq!(
            c.advice.as_deref(),
            Some("Use PostgreSQL unless specific need validated")
        );
    }

    #[test]
    fn first_match_wins() {
        let table = CategoryTable::new("axis", Verdict::NeedsReview)
            .entry(CategoryEntry::new("x", Verdict::Rejected))
            .entry(CategoryEntry::new("x", Verdict::Accepted));
        assert_eq!(table.classify("x").verdict, Verdict::Rejected);

        let reordered = CategoryTable::new("axis", Verdict::NeedsReview)
            .entry(CategoryEntry::new("x", Verdict::Accepted))
            .entry(CategoryEntry::new("x", Verdict::Rejected));
        assert_eq!(reordered.classify("x").verdict, Verdict::Accepted);
    }

    #[test]
    fn unknown_axis_is_an_error() {
        let tables = CategoryTables::builtin();
        assert!(matches!(
            tables.classify("color", "red"),
            Err(CategoryError::UnknownAxis { .. })
        ));
    }

    #[test]
    fn duplicate_axes_are_rejected() {
        let result = CategoryTables::new(vec![
            CategoryTable::new("a", Verdict::Accepted),
            CategoryTable::new("a", Verdict::Rejected),
        ]);
        assert!(matches!(result, Err(CategoryError::DuplicateAxis { .. })));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut tables = CategoryTables::builtin();
        tables.upsert(CategoryTable::new(SIMPLER_ALTERNATIVE_CHECKED, Verdict::Accepted));
        assert_eq!(
            tables.classify(SIMPLER_ALTERNATIVE_CHECKED, "cobol").unwrap(),
            Verdict::Accepted
        );
        assert_eq!(
            tables.iter().next().map(|t| t.axis.as_str()),
            Some(SIMPLER_ALTERNATIVE_CHECKED)
        );
    }
}
