//! Rule base: named, composable goals over facts, validators, and matchers.
//!
//! A rule base is validated once, at construction: every referenced goal must
//! exist, names must be unique, and the goal dependency graph must be acyclic.
//! Resolution can then recurse through sub-goals without a depth guard.

pub mod builtin;
pub mod term;

use std::collections::HashMap;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};

pub use term::{Clause, FactPredicate, GoalDefinition, Term, ValueSource};

/// On-disk form of a rule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub goals: Vec<GoalDefinition>,
}

/// A validated, immutable set of goal definitions.
#[derive(Debug, Clone)]
pub struct RuleBase {
    goals: Vec<GoalDefinition>,
    index: HashMap<String, usize>,
}

impl RuleBase {
    /// Build and validate a rule base.
    pub fn new(goals: Vec<GoalDefinition>) -> RuleResult<Self> {
        let mut index = HashMap::with_capacity(goals.len());
        for (i, goal) in goals.iter().enumerate() {
            if goal.clauses.is_empty() {
                return Err(RuleError::EmptyGoal {
                    goal: goal.name.clone(),
                });
            }
            if index.insert(goal.name.clone(), i).is_some() {
                return Err(RuleError::DuplicateGoal {
                    goal: goal.name.clone(),
                });
            }
        }

        let base = Self { goals, index };
        base.check_acyclic()?;
        Ok(base)
    }

    /// The phase-gate hierarchy.
    pub fn builtin() -> Self {
        let goals = builtin::definitions();
        let index = goals
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), i))
            .collect();
        Self { goals, index }
    }

    /// Replace same-named goals and append new ones, then re-validate.
    pub fn extend(self, overrides: Vec<GoalDefinition>) -> RuleResult<Self> {
        let mut goals = self.goals;
        for def in overrides {
            match goals.iter_mut().find(|g| g.name == def.name) {
                Some(existing) => *existing = def,
                None => goals.push(def),
            }
        }
        Self::new(goals)
    }

    pub fn from_toml_str(content: &str) -> RuleResult<Self> {
        Self::new(parse_rule_file(content)?.goals)
    }

    /// Load goal definitions from a TOML rule file.
    pub fn load_definitions(path: &Path) -> RuleResult<Vec<GoalDefinition>> {
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::Parse {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(parse_rule_file(&content)?.goals)
    }

    pub fn get(&self, name: &str) -> RuleResult<&GoalDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.goals[i])
            .ok_or_else(|| RuleError::UnknownGoal {
                goal: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Goal definitions in declaration order.
    pub fn goals(&self) -> &[GoalDefinition] {
        &self.goals
    }

    /// Names of goals that `name` depends on directly, in term order.
    pub fn dependencies(&self, name: &str) -> RuleResult<Vec<&str>> {
        let mut deps: Vec<&str> = Vec::new();
        for dep in self.get(name)?.terms().filter_map(Term::goal_ref) {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        Ok(deps)
    }

    pub fn to_toml_string(&self) -> RuleResult<String> {
        let file = RuleFile {
            goals: self.goals.clone(),
        };
        toml::to_string_pretty(&file).map_err(|e| RuleError::Parse {
            message: e.to_string(),
        })
    }

    fn check_acyclic(&self) -> RuleResult<()> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.goals.len()).map(|i| graph.add_node(i)).collect();

        for (i, goal) in self.goals.iter().enumerate() {
            for dep in goal.terms().filter_map(Term::goal_ref) {
                let &j = self.index.get(dep).ok_or_else(|| RuleError::UnknownGoal {
                    goal: dep.to_string(),
                })?;
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }

        petgraph::algo::toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| RuleError::CyclicGoalDefinition {
                goal: self.goals[graph[cycle.node_id()]].name.clone(),
            })
    }
}

fn parse_rule_file(content: &str) -> RuleResult<RuleFile> {
    toml::from_str(content).map_err(|e| RuleError::Parse {
        message: e.to_string(),
    })
}
