//! Engine configuration
//!
//! Every threshold the pipeline consults lives here. The defaults are
//! illustrative operating points, not tuned constants; operators override
//! them from a config document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-domain routing policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainPolicy {
    /// Minimum trust score a candidate agent needs for this domain.
    #[serde(default = "default_min_trust")]
    pub min_trust: f64,
    /// Domain requires compliance certifications; low-confidence work in it
    /// goes to a human reviewer.
    #[serde(default)]
    pub requires_compliance: bool,
    /// Classification confidence below which compliance domains escalate.
    #[serde(default = "default_human_review_threshold")]
    pub human_review_threshold: f64,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            min_trust: default_min_trust(),
            requires_compliance: false,
            human_review_threshold: default_human_review_threshold(),
        }
    }
}

/// Routing policy knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Below this classification confidence the generic generator handles
    /// the area regardless of candidates.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Trust floor for domains with no explicit entry.
    #[serde(default = "default_min_trust")]
    pub default_min_trust: f64,
    #[serde(default)]
    pub domains: BTreeMap<String, DomainPolicy>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut domains = BTreeMap::new();
        domains.insert(
            "compliance".to_string(),
            DomainPolicy {
                min_trust: 0.9,
                requires_compliance: true,
                human_review_threshold: default_human_review_threshold(),
            },
        );
        domains.insert(
            "security".to_string(),
            DomainPolicy {
                min_trust: 0.85,
                requires_compliance: false,
                human_review_threshold: default_human_review_threshold(),
            },
        );
        Self {
            min_confidence: default_min_confidence(),
            default_min_trust: default_min_trust(),
            domains,
        }
    }
}

impl PolicyConfig {
    pub fn domain(&self, name: &str) -> DomainPolicy {
        self.domains.get(name).cloned().unwrap_or(DomainPolicy {
            min_trust: self.default_min_trust,
            ..DomainPolicy::default()
        })
    }
}

/// Classifier knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Confidence reported when no domain scores above zero.
    #[serde(default = "default_general_floor")]
    pub general_floor: f64,
    /// Blended confidence above which the secondary's domain is adopted.
    #[serde(default = "default_ensemble_threshold")]
    pub ensemble_adopt_threshold: f64,
    /// Hard deadline on the secondary oracle.
    #[serde(default = "default_secondary_timeout_ms")]
    pub secondary_timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            general_floor: default_general_floor(),
            ensemble_adopt_threshold: default_ensemble_threshold(),
            secondary_timeout_ms: default_secondary_timeout_ms(),
        }
    }
}

/// Duplicate/conflict checker knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Similarity above this rejects the candidate as a duplicate.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
        }
    }
}

/// Retry discipline for transient collaborator failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff doubles from this base per attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Collaborator response cache knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Maximum concurrent contract generations per batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_generations: usize,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            max_concurrent_generations: default_max_concurrent(),
            policy: PolicyConfig::default(),
            classifier: ClassifierConfig::default(),
            dedup: DedupConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Environment label stamped onto manifests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(pub String);

impl Default for Environment {
    fn default() -> Self {
        Self("development".into())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_min_confidence() -> f64 {
    0.5
}
fn default_min_trust() -> f64 {
    0.7
}
fn default_human_review_threshold() -> f64 {
    0.75
}
fn default_general_floor() -> f64 {
    0.2
}
fn default_ensemble_threshold() -> f64 {
    0.6
}
fn default_secondary_timeout_ms() -> u64 {
    1_500
}
fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_top_k() -> usize {
    5
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    200
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_max_concurrent() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_concurrent_generations, 5);
        assert_eq!(cfg.policy.min_confidence, 0.5);
        assert_eq!(cfg.dedup.similarity_threshold, 0.85);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.environment.to_string(), "development");
    }

    #[test]
    fn unknown_domain_falls_back_to_default_floor() {
        let cfg = PolicyConfig::default();
        let dp = cfg.domain("frontend");
        assert_eq!(dp.min_trust, cfg.default_min_trust);
        assert!(!dp.requires_compliance);
    }

    #[test]
    fn compliance_domain_is_certified_by_default() {
        let cfg = PolicyConfig::default();
        assert!(cfg.domain("compliance").requires_compliance);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"max_concurrent_generations": 2}"#).unwrap();
        assert_eq!(cfg.max_concurrent_generations, 2);
        assert_eq!(cfg.policy.min_confidence, 0.5);
        assert_eq!(cfg.cache.ttl_secs, 300);
    }
}
