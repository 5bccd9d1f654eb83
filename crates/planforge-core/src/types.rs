//! Core types for Planforge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One unit of requested work, as read from a batch document.
/// Immutable once parsed; unknown fields are rejected at the boundary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnhancementArea {
    /// Unique within the batch.
    pub name: String,
    pub objective: String,
    #[serde(default)]
    pub key_requirements: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    /// Names of other areas in the same batch this one builds on.
    /// Names that resolve to nothing in the batch are ignored for graph
    /// purposes, never treated as satisfied.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl EnhancementArea {
    pub fn new(name: impl Into<String>, objective: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objective: objective.into(),
            key_requirements: Vec::new(),
            sources: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_depends_on(mut self, deps: &[&str]) -> Self {
        self.depends_on = deps.iter().map(|d| d.to_string()).collect();
        self
    }
}

/// Structured implementation plan inside a contract.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImplementationPlan {
    pub modules: Vec<String>,
    pub architecture: String,
}

/// Governance review fields carried by every contract.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Governance {
    pub security: String,
    pub compliance: String,
    pub ethics: String,
}

/// Validated, structured implementation specification for one enhancement
/// area. Created once per accepted area; never mutated after acceptance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentContract {
    pub enhancement_area: String,
    pub objective: String,
    pub implementation_plan: ImplementationPlan,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub governance: Governance,
    #[serde(default)]
    pub validation_criteria: Vec<String>,
    pub confidence_score: f64,
}

impl AgentContract {
    /// The text submitted for similarity matching: objective plus a flat
    /// summary of the plan.
    pub fn descriptive_text(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.objective,
            self.implementation_plan.architecture,
            self.implementation_plan.modules.join(", "),
        )
    }

    /// Schema check beyond what serde enforces. Violations are permanent
    /// for the given input.
    pub fn validate(&self) -> crate::Result<()> {
        if self.enhancement_area.trim().is_empty() {
            return Err(crate::Error::validation(
                "contract",
                "enhancement_area is empty",
            ));
        }
        if self.objective.trim().is_empty() {
            return Err(crate::Error::validation(
                &self.enhancement_area,
                "objective is empty",
            ));
        }
        if self.implementation_plan.modules.is_empty() {
            return Err(crate::Error::validation(
                &self.enhancement_area,
                "implementation_plan.modules is empty",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(crate::Error::validation(
                &self.enhancement_area,
                format!(
                    "confidence_score {} outside [0, 1]",
                    self.confidence_score
                ),
            ));
        }
        Ok(())
    }
}

/// Catalog entry for a candidate worker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentMeta {
    pub agent_id: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub trust_score: f64,
    /// Advisory only. Never enters the trust comparison; an agent cannot
    /// promote itself.
    #[serde(default)]
    pub preferred: bool,
}

impl AgentMeta {
    pub fn new(agent_id: impl Into<String>, trust_score: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            domains: Vec::new(),
            capabilities: Vec::new(),
            trust_score,
            preferred: false,
        }
    }

    pub fn with_domains(mut self, domains: &[&str]) -> Self {
        self.domains = domains.iter().map(|d| d.to_string()).collect();
        self
    }
}

/// Who produces the detailed contract for an area.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Agent,
    Llm,
    Human,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Llm => write!(f, "llm"),
            Self::Human => write!(f, "human"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

/// Outcome of the policy cascade for one area.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolicyDecision {
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub explanation: String,
    pub confidence: f64,
    pub policy_rules_applied: Vec<String>,
    pub risk_assessment: RiskAssessment,
}

/// A dependency edge: `from` must be built before `to`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Cycle-free build graph over the accepted contracts of one batch.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
    /// Permutation of `nodes` in which every edge's `from` precedes its `to`.
    pub build_order: Vec<String>,
}

/// Append-only audit record. Self-contained: own timestamp and correlation
/// id, never mutated post-write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub actor: String,
    pub action: String,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AuditEntry {
    pub fn new(
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
        action: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            actor: actor.into(),
            action: action.into(),
            payload,
            duration_ms: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// How each area of a batch ended up.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchCounts {
    pub received: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub escalated: usize,
}

/// The compiled output: every accepted contract plus the ordered roadmap,
/// wrapped with run metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub environment: String,
    pub counts: BatchCounts,
    pub enhancements: Vec<AgentContract>,
    pub roadmap: DependencyGraph,
}

impl Manifest {
    pub fn new(
        version: impl Into<String>,
        environment: impl Into<String>,
        counts: BatchCounts,
        enhancements: Vec<AgentContract>,
        roadmap: DependencyGraph,
    ) -> Self {
        Self {
            version: version.into(),
            generated_at: Utc::now(),
            environment: environment.into(),
            counts,
            enhancements,
            roadmap,
        }
    }

    pub fn contract(&self, area: &str) -> Option<&AgentContract> {
        self.enhancements.iter().find(|c| c.enhancement_area == area)
    }
}
