//! Duplicate/conflict checker
//!
//! Gates acceptance against historical work in the similarity store.
//! Duplicate prevention is a quality safeguard, not a safety gate: if the
//! store is unreachable the check fails open and the candidate is accepted
//! with a logged warning.

use planforge_core::{AgentContract, DedupConfig};
use planforge_vector::{SimilarityStore, VectorRecord};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a duplicate/conflict check.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Accept,
    Reject { reason: String },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

pub struct DuplicateChecker {
    store: Arc<dyn SimilarityStore>,
    config: DedupConfig,
}

impl DuplicateChecker {
    pub fn new(store: Arc<dyn SimilarityStore>, config: DedupConfig) -> Self {
        Self { store, config }
    }

    pub async fn check(&self, candidate: &AgentContract) -> Verdict {
        let text = candidate.descriptive_text();

        let vectors = match self.store.embed(std::slice::from_ref(&text)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    area = %candidate.enhancement_area,
                    error = %e,
                    "similarity store unreachable during embed, failing open"
                );
                return Verdict::Accept;
            }
        };
        let Some(vector) = vectors.first() else {
            warn!(
                area = %candidate.enhancement_area,
                "similarity store returned no embedding, failing open"
            );
            return Verdict::Accept;
        };

        let matches = match self.store.query(vector, None, self.config.top_k).await {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    area = %candidate.enhancement_area,
                    error = %e,
                    "similarity store unreachable during query, failing open"
                );
                return Verdict::Accept;
            }
        };

        for hit in &matches {
            if hit.score > self.config.similarity_threshold {
                return Verdict::Reject {
                    reason: format!(
                        "duplicate of '{}' (similarity {:.2} > {:.2})",
                        hit.id, hit.score, self.config.similarity_threshold
                    ),
                };
            }
            // Conflict: accepting this candidate would retroactively create a
            // dependency on work that already depends on it.
            let depends_on_candidate = hit.metadata["depends_on"]
                .as_array()
                .map(|deps| {
                    deps.iter()
                        .any(|d| d.as_str() == Some(candidate.enhancement_area.as_str()))
                })
                .unwrap_or(false);
            if depends_on_candidate {
                return Verdict::Reject {
                    reason: format!(
                        "conflict: existing work '{}' already depends on '{}'",
                        hit.id, candidate.enhancement_area
                    ),
                };
            }
        }

        debug!(
            area = %candidate.enhancement_area,
            matches = matches.len(),
            "no duplicate or conflict"
        );
        Verdict::Accept
    }

    /// Record an accepted contract so later resubmissions are caught.
    /// Best-effort for the same reason check() fails open.
    pub async fn record(&self, contract: &AgentContract) {
        let text = contract.descriptive_text();
        let vectors = match self.store.embed(std::slice::from_ref(&text)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    area = %contract.enhancement_area,
                    error = %e,
                    "could not embed accepted contract for history"
                );
                return;
            }
        };
        let Some(vector) = vectors.into_iter().next() else {
            return;
        };

        let record = VectorRecord {
            id: contract.enhancement_area.clone(),
            vector,
            metadata: json!({
                "enhancement_area": contract.enhancement_area,
                "objective": contract.objective,
                "depends_on": contract.depends_on,
            }),
        };
        if let Err(e) = self.store.upsert(vec![record]).await {
            warn!(
                area = %contract.enhancement_area,
                error = %e,
                "could not persist accepted contract to similarity store"
            );
        }
    }
}
