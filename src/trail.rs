//! Decision trail: an append-only log of the choices made around a gate.
//!
//! The engine never writes anything itself. Callers that want an audit trail
//! build a [`DecisionRecord`], optionally attach the gate outcome it was based
//! on, and hand it to a [`DecisionSink`].

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{TrailError, TrailResult};
use crate::resolve::Evaluation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reversibility {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Impact {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(invalid("impact", format!("expected high, medium or low, got \"{other}\""))),
        }
    }
}

impl FromStr for Reversibility {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(invalid(
                "reversibility",
                format!("expected easy, medium or hard, got \"{other}\""),
            )),
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

impl fmt::Display for Reversibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}

fn invalid(field: &str, message: impl Into<String>) -> TrailError {
    TrailError::InvalidRecord {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Summary of the gate evaluation a decision was based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub goal: String,
    pub satisfied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

impl From<&Evaluation> for GateOutcome {
    fn from(eval: &Evaluation) -> Self {
        Self {
            goal: eval.goal.clone(),
            satisfied: eval.satisfied,
            root_cause: eval.root_cause().map(|f| f.to_string()),
        }
    }
}

/// One logged decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Seconds since the Unix epoch.
    pub recorded_at: u64,
    pub initiative: String,
    pub topic: String,
    pub chosen: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    /// The conditions under which the choice stays viable.
    #[serde(default)]
    pub conditions: String,
    pub confidence: f64,
    pub impact: Impact,
    pub reversibility: Reversibility,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub trade_offs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateOutcome>,
}

impl DecisionRecord {
    /// A record stamped with the current time, impact `high`, and
    /// reversibility `medium`.
    pub fn new(
        initiative: impl Into<String>,
        topic: impl Into<String>,
        chosen: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            recorded_at,
            initiative: initiative.into(),
            topic: topic.into(),
            chosen: chosen.into(),
            alternatives: Vec::new(),
            rationale: String::new(),
            conditions: String::new(),
            confidence,
            impact: Impact::High,
            reversibility: Reversibility::Medium,
            trade_offs: BTreeMap::new(),
            gate: None,
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.conditions = conditions.into();
        self
    }

    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_reversibility(mut self, reversibility: Reversibility) -> Self {
        self.reversibility = reversibility;
        self
    }

    pub fn with_trade_off(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.trade_offs.insert(key.into(), value.into());
        self
    }

    pub fn with_gate(mut self, evaluation: &Evaluation) -> Self {
        self.gate = Some(GateOutcome::from(evaluation));
        self
    }

    pub fn validate(&self) -> TrailResult<()> {
        if self.topic.trim().is_empty() {
            return Err(invalid("topic", "must not be empty"));
        }
        if self.chosen.trim().is_empty() {
            return Err(invalid("chosen", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(invalid(
                "confidence",
                format!("must lie in [0, 1], got {}", self.confidence),
            ));
        }
        Ok(())
    }

    /// Human-readable rendering of the record.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!("# Decision: {}", self.topic),
            String::new(),
            format!("**Initiative**: {}", self.initiative),
            format!("**Confidence**: {:.0}%", self.confidence * 100.0),
            format!("**Impact**: {}", self.impact),
            format!("**Reversibility**: {}", self.reversibility),
            String::new(),
            "## Chosen Path".into(),
            String::new(),
            self.chosen.clone(),
        ];
        if !self.rationale.is_empty() {
            lines.push(String::new());
            lines.push("### Rationale".to_string());
            lines.push(String::new());
            lines.push(self.rationale.clone());
        }
        if !self.conditions.is_empty() {
            lines.push(String::new());
            lines.push("### Viability Conditions".to_string());
            lines.push(String::new());
            lines.push(self.conditions.clone());
        }
        if let Some(gate) = &self.gate {
            lines.push(String::new());
            lines.push(format!(
                "**Gate**: {} {}",
                gate.goal,
                if gate.satisfied { "satisfied" } else { "not satisfied" }
            ));
            if let Some(cause) = &gate.root_cause {
                lines.push(format!("Blocked by: {cause}"));
            }
        }
        if !self.alternatives.is_empty() {
            lines.push(String::new());
            lines.push("## Alternatives Considered".to_string());
            lines.push(String::new());
            for (i, alt) in self.alternatives.iter().enumerate() {
                lines.push(format!("{}. {alt}", i + 1));
            }
        }
        if !self.trade_offs.is_empty() {
            lines.push(String::new());
            lines.push("## Trade-Offs".to_string());
            lines.push(String::new());
            for (key, value) in &self.trade_offs {
                lines.push(format!("- **{key}**: {value}"));
            }
        }
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for decision records.
pub trait DecisionSink {
    fn record(&mut self, record: &DecisionRecord) -> TrailResult<()>;
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DecisionSink for JsonlSink<W> {
    fn record(&mut self, record: &DecisionRecord) -> TrailResult<()> {
        record.validate()?;
        let line = serde_json::to_string(record).map_err(|e| TrailError::Serialize {
            message: e.to_string(),
        })?;
        writeln!(self.writer, "{line}").map_err(|source| TrailError::Io { source })?;
        self.writer
            .flush()
            .map_err(|source| TrailError::Io { source })?;
        tracing::debug!(topic = %record.topic, initiative = %record.initiative, "decision recorded");
        Ok(())
    }
}

/// Read records back, keeping those whose topic contains `topic_filter`
/// (case-insensitive). Blank lines are skipped.
pub fn read_records(
    reader: impl BufRead,
    topic_filter: Option<&str>,
) -> TrailResult<Vec<DecisionRecord>> {
    let needle = topic_filter.map(str::to_lowercase);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| TrailError::Io { source })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DecisionRecord =
            serde_json::from_str(&line).map_err(|e| TrailError::Serialize {
                message: e.to_string(),
            })?;
        if needle
            .as_deref()
            .is_none_or(|n| record.topic.to_lowercase().contains(n))
        {
            records.push(record);
        }
    }
    Ok(records)
}

/// The most recent decision on a topic, whose alternatives are the fallback
/// plans if its conditions stop holding.
pub fn latest_decision<'a>(
    records: &'a [DecisionRecord],
    topic: &str,
) -> Option<&'a DecisionRecord> {
    let needle = topic.to_lowercase();
    records
        .iter()
        .rev()
        .find(|r| r.topic.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str, chosen: &str) -> DecisionRecord {
        DecisionRecord::new("acme", topic, chosen, 0.75)
            .with_alternatives(vec!["flask".into(), "go".into()])
            .with_rationale("team knows it")
            .with_conditions("works if traffic stays under 10K users")
    }

    #[test]
    fn sink_writes_one_line_per_record() {
        let mut sink = JsonlSink::new(Vec::new());
        sink.record(&record("backend framework", "fastapi")).unwrap();
        sink.record(&record("database", "postgres")).unwrap();
        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 2);

        let records = read_records(text.as_bytes(), Some("DATABASE")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chosen, "postgres");
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        let mut sink = JsonlSink::new(Vec::new());
        let bad = DecisionRecord::new("acme", "db", "postgres", 1.5);
        assert!(matches!(
            sink.record(&bad),
            Err(TrailError::InvalidRecord { .. })
        ));
        assert!(sink.into_inner().is_empty());
        assert!(DecisionRecord::new("acme", "db", "postgres", f64::NAN).validate().is_err());
        assert!(DecisionRecord::new("acme", " ", "postgres", 0.5).validate().is_err());
    }

    #[test]
    fn latest_decision_wins() {
        let records = vec![record("database", "mongodb"), record("database", "postgres")];
        let latest = latest_decision(&records, "data").unwrap();
        assert_eq!(latest.chosen, "postgres");
        assert_eq!(latest.alternatives, vec!["flask", "go"]);
        assert!(latest_decision(&records, "pricing").is_none());
    }

    #[test]
    fn markdown_lists_alternatives() {
        let md = record("backend framework", "fastapi")
            .with_trade_off("speed", "less ecosystem")
            .to_markdown();
        assert!(md.starts_with("# Decision: backend framework"));
        assert!(md.contains("**Confidence**: 75%"));
        assert!(md.contains("1. flask\n2. go"));
        assert!(md.contains("- **speed**: less ecosystem"));
    }

    #[test]
    fn enum_parsing() {
        assert_eq!("HIGH".parse::<Impact>().unwrap(), Impact::High);
        assert_eq!("hard".parse::<Reversibility>().unwrap(), Reversibility::Hard);
        assert!("sometimes".parse::<Reversibility>().is_err());
    }
}
