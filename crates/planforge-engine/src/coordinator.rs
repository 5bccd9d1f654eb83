//! Manifest coordinator
//!
//! Sequences the whole pipeline per batch: classify → route → generate →
//! duplicate-check per area with bounded parallelism, then one graph build
//! over everything accepted. Per-area failures are isolated; a dependency
//! cycle fails the batch with no partial manifest.

use crate::audit::AuditLog;
use crate::classify::{EnsembleClassifier, SecondaryClassifier};
use crate::contract::ContractGenerator;
use crate::dedup::{DuplicateChecker, Verdict};
use crate::escalate::{AuditEscalator, EscalationSink};
use crate::graph;
use crate::policy::{PolicyEngine, RequestContext};
use crate::registry::AgentRegistry;
use planforge_core::{
    AgentContract, BatchCounts, EngineConfig, EnhancementArea, Error, Manifest, Result, Route,
};
use planforge_llm::TextGenerator;
use planforge_vector::SimilarityStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Terminal state of one area within a batch.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AreaStatus {
    Accepted,
    Rejected,
    Escalated,
}

/// How one area resolved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaResolution {
    pub area: String,
    pub correlation_id: String,
    pub status: AreaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<AgentContract>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One issue found while re-validating a manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub subject: String,
    pub detail: String,
}

/// Result of `validate_outputs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// One entry of the ordered dispatch plan emitted by `execute_delegation`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub position: usize,
    pub enhancement_area: String,
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub correlation_id: String,
}

/// Top-level orchestrator. Cheap to clone: every collaborator is shared.
#[derive(Clone)]
pub struct Coordinator {
    classifier: Arc<EnsembleClassifier>,
    registry: Arc<AgentRegistry>,
    policy: PolicyEngine,
    contracts: Arc<ContractGenerator>,
    dedup: Arc<DuplicateChecker>,
    audit: Arc<AuditLog>,
    escalation: Arc<dyn EscalationSink>,
    config: EngineConfig,
}

impl Coordinator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn SimilarityStore>,
        registry: Arc<AgentRegistry>,
        config: EngineConfig,
    ) -> Self {
        let audit = Arc::new(AuditLog::new());
        Self {
            classifier: Arc::new(EnsembleClassifier::new(&config.classifier)),
            registry,
            policy: PolicyEngine::new(config.policy.clone()),
            contracts: Arc::new(ContractGenerator::new(generator)),
            dedup: Arc::new(DuplicateChecker::new(store, config.dedup.clone())),
            escalation: Arc::new(AuditEscalator::new(audit.clone())),
            audit,
            config,
        }
    }

    pub fn with_secondary_classifier(mut self, secondary: Arc<dyn SecondaryClassifier>) -> Self {
        self.classifier = Arc::new(
            EnsembleClassifier::new(&self.config.classifier).with_secondary(secondary),
        );
        self
    }

    pub fn with_escalation(mut self, sink: Arc<dyn EscalationSink>) -> Self {
        self.escalation = sink;
        self
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Run a whole batch to a manifest. Fails with `Cycle` (no partial
    /// manifest) if the accepted contracts cannot be ordered, and with
    /// `Cancelled` if the token fires before the batch finishes.
    pub async fn compile_manifest(
        &self,
        areas: Vec<EnhancementArea>,
        cancel: CancellationToken,
    ) -> Result<Manifest> {
        let batch_id = format!("batch-{}", Uuid::new_v4());
        self.audit.record(
            &batch_id,
            "coordinator",
            "batch_received",
            json!({ "areas": areas.len() }),
        );

        let mut seen = HashSet::new();
        for area in &areas {
            if !seen.insert(area.name.clone()) {
                return Err(Error::validation(
                    "batch",
                    format!("duplicate enhancement area name '{}'", area.name),
                ));
            }
        }

        let received = areas.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_generations));
        let mut handles = Vec::with_capacity(received);
        for (index, area) in areas.into_iter().enumerate() {
            let this = self.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let batch_id = batch_id.clone();
            handles.push(tokio::spawn(async move {
                (index, this.process_area(area, semaphore, cancel, &batch_id).await)
            }));
        }

        let mut resolutions: Vec<(usize, AreaResolution)> = Vec::with_capacity(received);
        for handle in handles {
            match handle.await {
                Ok(pair) => resolutions.push(pair),
                Err(e) => {
                    // A panicked worker loses its area, never its siblings.
                    warn!(error = %e, "area worker task failed");
                }
            }
        }
        resolutions.sort_by_key(|(index, _)| *index);
        let resolutions: Vec<AreaResolution> =
            resolutions.into_iter().map(|(_, r)| r).collect();

        if cancel.is_cancelled() {
            self.audit.record(
                &batch_id,
                "coordinator",
                "batch_cancelled",
                json!({ "resolved": resolutions.len() }),
            );
            return Err(Error::Cancelled);
        }

        let counts = BatchCounts {
            received,
            accepted: resolutions
                .iter()
                .filter(|r| r.status == AreaStatus::Accepted)
                .count(),
            rejected: resolutions
                .iter()
                .filter(|r| r.status == AreaStatus::Rejected)
                .count(),
            escalated: resolutions
                .iter()
                .filter(|r| r.status == AreaStatus::Escalated)
                .count(),
        };

        let accepted: Vec<AgentContract> = resolutions
            .into_iter()
            .filter_map(|r| r.contract)
            .collect();

        // Exactly once per batch, after every area has resolved.
        let roadmap = graph::build(&accepted).map_err(|e| {
            if let Error::Cycle { ref nodes } = e {
                self.audit.record(
                    &batch_id,
                    "coordinator",
                    "batch_failed_cycle",
                    json!({ "unresolved": nodes }),
                );
            }
            e
        })?;

        self.audit.record(
            &batch_id,
            "coordinator",
            "manifest_compiled",
            json!({
                "accepted": counts.accepted,
                "rejected": counts.rejected,
                "escalated": counts.escalated,
            }),
        );
        info!(
            batch = %batch_id,
            accepted = counts.accepted,
            rejected = counts.rejected,
            escalated = counts.escalated,
            "manifest compiled"
        );

        Ok(Manifest::new(
            env!("CARGO_PKG_VERSION"),
            self.config.environment.to_string(),
            counts,
            accepted,
            roadmap,
        ))
    }

    /// Drive one area through its lifecycle. Never returns an error: every
    /// failure is folded into the resolution and the audit trail, so
    /// siblings are untouched.
    async fn process_area(
        &self,
        area: EnhancementArea,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
        batch_id: &str,
    ) -> AreaResolution {
        let correlation_id = format!("{}:{}", batch_id, Uuid::new_v4());
        self.audit.record(
            &correlation_id,
            "coordinator",
            "received",
            json!({ "area": area.name }),
        );

        if area.objective.trim().is_empty() {
            return self.reject(
                &area,
                &correlation_id,
                Error::validation(&area.name, "objective is empty"),
            );
        }

        let text = format!(
            "{} {} {}",
            area.name,
            area.objective,
            area.key_requirements.join(" ")
        );
        let domain = self.classifier.classify(&text).await;
        self.audit.record(
            &correlation_id,
            "classifier",
            "classified",
            json!({
                "domain": domain.domain,
                "confidence": domain.confidence,
                "explanation": domain.explanation,
            }),
        );

        let candidates = self.registry.list_by_domain(&domain.domain);
        let ctx = RequestContext {
            area: area.name.clone(),
            correlation_id: correlation_id.clone(),
        };
        let decision = self.policy.decide(&domain, &candidates, &ctx);
        self.audit.record(
            &correlation_id,
            "policy",
            "policy_evaluated",
            json!({
                "route": decision.route,
                "agent_id": decision.agent_id,
                "rules": decision.policy_rules_applied,
                "risk": decision.risk_assessment,
            }),
        );

        if decision.route == Route::Human {
            self.escalation.escalate(&area, &decision.explanation).await;
            self.audit.record(
                &correlation_id,
                "coordinator",
                "escalated",
                json!({ "reason": decision.explanation }),
            );
            return AreaResolution {
                area: area.name,
                correlation_id,
                status: AreaStatus::Escalated,
                contract: None,
                reason: Some(decision.explanation),
            };
        }

        // Cancellation stops issuing new external calls. In-flight siblings
        // finish and record on their own.
        if cancel.is_cancelled() {
            return self.reject(&area, &correlation_id, Error::Cancelled);
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => return self.reject(&area, &correlation_id, Error::Cancelled),
        };
        if cancel.is_cancelled() {
            return self.reject(&area, &correlation_id, Error::Cancelled);
        }

        let started = Instant::now();
        let generated = self.contracts.generate(&area, &decision).await;
        drop(permit);

        let contract = match generated {
            Ok(c) => c,
            Err(e) => return self.reject(&area, &correlation_id, e),
        };
        self.audit.append(
            planforge_core::AuditEntry::new(
                &correlation_id,
                "generator",
                "contract_generated",
                json!({ "confidence_score": contract.confidence_score }),
            )
            .with_duration(started.elapsed().as_millis() as u64),
        );

        let verdict = self.dedup.check(&contract).await;
        self.audit.record(
            &correlation_id,
            "dedup",
            "duplicate_checked",
            match &verdict {
                Verdict::Accept => json!({ "accept": true }),
                Verdict::Reject { reason } => json!({ "accept": false, "reason": reason }),
            },
        );

        match verdict {
            Verdict::Accept => {
                self.dedup.record(&contract).await;
                self.audit.record(
                    &correlation_id,
                    "coordinator",
                    "accepted",
                    json!({ "area": area.name }),
                );
                AreaResolution {
                    area: area.name,
                    correlation_id,
                    status: AreaStatus::Accepted,
                    contract: Some(contract),
                    reason: None,
                }
            }
            Verdict::Reject { reason } => {
                self.reject(&area, &correlation_id, Error::duplicate(&area.name, reason))
            }
        }
    }

    fn reject(
        &self,
        area: &EnhancementArea,
        correlation_id: &str,
        error: Error,
    ) -> AreaResolution {
        let report = error.report(correlation_id);
        self.audit.record(
            correlation_id,
            "coordinator",
            "rejected",
            json!({
                "area": area.name,
                "kind": report.kind,
                "reason": report.message,
                "recovery": report.recovery,
            }),
        );
        AreaResolution {
            area: area.name.clone(),
            correlation_id: correlation_id.to_string(),
            status: AreaStatus::Rejected,
            contract: None,
            reason: Some(report.message),
        }
    }

    /// Re-validate a manifest: every contract against the schema, and the
    /// roadmap against its own invariants.
    pub fn validate_outputs(&self, manifest: &Manifest) -> ValidationReport {
        let mut issues = Vec::new();

        for contract in &manifest.enhancements {
            if let Err(e) = contract.validate() {
                issues.push(ValidationIssue {
                    subject: contract.enhancement_area.clone(),
                    detail: e.to_string(),
                });
            }
        }

        let roadmap = &manifest.roadmap;
        let node_set: HashSet<&str> = roadmap.nodes.iter().map(String::as_str).collect();
        if node_set.len() != roadmap.nodes.len() {
            issues.push(ValidationIssue {
                subject: "roadmap".into(),
                detail: "node names are not unique".into(),
            });
        }
        for contract in &manifest.enhancements {
            if !node_set.contains(contract.enhancement_area.as_str()) {
                issues.push(ValidationIssue {
                    subject: contract.enhancement_area.clone(),
                    detail: "contract missing from roadmap nodes".into(),
                });
            }
        }
        for edge in &roadmap.edges {
            if !node_set.contains(edge.from.as_str()) || !node_set.contains(edge.to.as_str()) {
                issues.push(ValidationIssue {
                    subject: "roadmap".into(),
                    detail: format!("edge {} -> {} leaves the node set", edge.from, edge.to),
                });
            }
        }
        let order_set: HashSet<&str> =
            roadmap.build_order.iter().map(String::as_str).collect();
        if order_set != node_set {
            issues.push(ValidationIssue {
                subject: "roadmap".into(),
                detail: "build_order is not a permutation of nodes".into(),
            });
        } else {
            let position = |name: &str| {
                roadmap
                    .build_order
                    .iter()
                    .position(|n| n == name)
                    .unwrap_or(usize::MAX)
            };
            for edge in &roadmap.edges {
                if position(&edge.from) >= position(&edge.to) {
                    issues.push(ValidationIssue {
                        subject: "roadmap".into(),
                        detail: format!(
                            "build_order places '{}' before its dependency '{}'",
                            edge.to, edge.from
                        ),
                    });
                }
            }
        }

        self.audit.record(
            "validate",
            "coordinator",
            "outputs_validated",
            json!({ "issues": issues.len() }),
        );

        ValidationReport {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// Emit the ordered dispatch plan for a compiled manifest. Routing is
    /// re-derived per contract (classification and policy are pure), so the
    /// plan reflects the current registry. Dispatch itself is out of scope.
    pub async fn execute_delegation(
        &self,
        manifest: &Manifest,
    ) -> Result<Vec<DelegationRecord>> {
        let mut records = Vec::with_capacity(manifest.roadmap.build_order.len());

        for (position, name) in manifest.roadmap.build_order.iter().enumerate() {
            let contract = manifest.contract(name).ok_or_else(|| {
                Error::validation("manifest", format!("build_order names unknown area '{}'", name))
            })?;

            let correlation_id = format!("delegate:{}", Uuid::new_v4());
            let domain = self.classifier.classify(&contract.descriptive_text()).await;
            let candidates = self.registry.list_by_domain(&domain.domain);
            let decision = self.policy.decide(
                &domain,
                &candidates,
                &RequestContext {
                    area: name.clone(),
                    correlation_id: correlation_id.clone(),
                },
            );

            self.audit.record(
                &correlation_id,
                "coordinator",
                "delegated",
                json!({
                    "area": name,
                    "position": position,
                    "route": decision.route,
                    "agent_id": decision.agent_id,
                }),
            );
            records.push(DelegationRecord {
                position,
                enhancement_area: name.clone(),
                route: decision.route,
                agent_id: decision.agent_id,
                correlation_id,
            });
        }

        Ok(records)
    }
}
