//! Domain classification
//!
//! Keyword-overlap scoring against a fixed domain table. Deterministic:
//! identical text always yields the identical result. An optional secondary
//! oracle can be blended in, but its failure never reaches the caller.

use planforge_core::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Classification outcome.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DomainResult {
    pub domain: String,
    pub confidence: f64,
    pub explanation: String,
}

/// Fixed domain → keyword table. Order matters: ties resolve to the
/// earliest entry.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "security",
        &[
            "auth", "authentication", "authorization", "encryption", "vulnerability",
            "security", "secrets", "token", "credential",
        ],
    ),
    (
        "compliance",
        &[
            "gdpr", "hipaa", "compliance", "retention", "consent", "regulatory",
            "audit", "certification",
        ],
    ),
    (
        "performance",
        &[
            "latency", "throughput", "cache", "caching", "performance", "optimize",
            "profiling", "concurrency",
        ],
    ),
    (
        "data",
        &[
            "schema", "database", "migration", "etl", "storage", "index", "query",
            "pipeline",
        ],
    ),
    (
        "infrastructure",
        &[
            "deploy", "deployment", "kubernetes", "scaling", "terraform", "ci",
            "infrastructure", "observability", "monitoring",
        ],
    ),
    (
        "machine-learning",
        &[
            "model", "training", "inference", "embedding", "llm", "prompt",
            "classifier", "evaluation",
        ],
    ),
    (
        "api",
        &[
            "endpoint", "rest", "grpc", "api", "versioning", "webhook", "sdk",
        ],
    ),
];

/// The primary classifier. Pure: no side effects, no hidden state.
#[derive(Clone, Debug)]
pub struct DomainClassifier {
    general_floor: f64,
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self { general_floor: 0.2 }
    }
}

impl DomainClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            general_floor: config.general_floor,
        }
    }

    pub fn classify(&self, text: &str) -> DomainResult {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut best: Option<(&str, usize, Vec<&str>)> = None;
        let mut total_hits = 0usize;

        for (domain, keywords) in DOMAIN_KEYWORDS {
            let matched: Vec<&str> = keywords
                .iter()
                .filter(|k| words.iter().any(|w| w.as_str() == **k))
                .copied()
                .collect();
            let score = matched.len();
            total_hits += score;
            if score > 0 && best.as_ref().map_or(true, |(_, b, _)| score > *b) {
                best = Some((*domain, score, matched));
            }
        }

        match best {
            Some((domain, score, matched)) => DomainResult {
                domain: domain.to_string(),
                confidence: score as f64 / total_hits as f64,
                explanation: format!("matched keywords: {}", matched.join(", ")),
            },
            None => DomainResult {
                domain: "general".to_string(),
                confidence: self.general_floor,
                explanation: "no domain keywords matched".to_string(),
            },
        }
    }
}

/// A secondary (e.g. model-based) oracle. Implementations are expected to
/// be slow and fallible; the ensemble enforces the deadline.
#[async_trait::async_trait]
pub trait SecondaryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> planforge_core::Result<DomainResult>;
}

/// Primary classifier, optionally blended with a secondary oracle.
pub struct EnsembleClassifier {
    primary: DomainClassifier,
    secondary: Option<Arc<dyn SecondaryClassifier>>,
    adopt_threshold: f64,
    secondary_timeout: Duration,
}

impl EnsembleClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            primary: DomainClassifier::new(config),
            secondary: None,
            adopt_threshold: config.ensemble_adopt_threshold,
            secondary_timeout: Duration::from_millis(config.secondary_timeout_ms),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn SecondaryClassifier>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Classify with blending. The secondary's failure or timeout falls
    /// back to the primary result; nothing propagates.
    pub async fn classify(&self, text: &str) -> DomainResult {
        let primary = self.primary.classify(text);

        let Some(secondary) = &self.secondary else {
            return primary;
        };

        let outcome =
            tokio::time::timeout(self.secondary_timeout, secondary.classify(text)).await;

        match outcome {
            Ok(Ok(sec)) => {
                let blended = (primary.confidence + sec.confidence) / 2.0;
                if blended > self.adopt_threshold {
                    DomainResult {
                        domain: sec.domain.clone(),
                        confidence: blended,
                        explanation: format!(
                            "ensemble adopted '{}' (blended {:.2}); primary said '{}'",
                            sec.domain, blended, primary.domain
                        ),
                    }
                } else {
                    DomainResult {
                        confidence: blended,
                        ..primary
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "secondary classifier failed, using primary");
                primary
            }
            Err(_) => {
                warn!("secondary classifier timed out, using primary");
                primary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_deterministic() {
        let c = DomainClassifier::default();
        let text = "Harden authentication and rotate secrets in the token service";
        let a = c.classify(text);
        let b = c.classify(text);
        assert_eq!(a, b);
        assert_eq!(a.domain, "security");
    }

    #[test]
    fn no_match_falls_back_to_general_floor() {
        let c = DomainClassifier::default();
        let result = c.classify("paint the bikeshed a nicer color");
        assert_eq!(result.domain, "general");
        assert!((result.confidence - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_text_picks_dominant_domain() {
        let c = DomainClassifier::default();
        let result =
            c.classify("reduce latency with a cache and better throughput; tweak one endpoint");
        assert_eq!(result.domain, "performance");
        assert!(result.confidence > 0.5);
        assert!(result.explanation.contains("cache"));
    }

    struct FixedSecondary(DomainResult);

    #[async_trait::async_trait]
    impl SecondaryClassifier for FixedSecondary {
        async fn classify(&self, _text: &str) -> planforge_core::Result<DomainResult> {
            Ok(self.0.clone())
        }
    }

    struct FailingSecondary;

    #[async_trait::async_trait]
    impl SecondaryClassifier for FailingSecondary {
        async fn classify(&self, _text: &str) -> planforge_core::Result<DomainResult> {
            Err(planforge_core::Error::external("oracle", "boom", true))
        }
    }

    struct SlowSecondary;

    #[async_trait::async_trait]
    impl SecondaryClassifier for SlowSecondary {
        async fn classify(&self, _text: &str) -> planforge_core::Result<DomainResult> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            unreachable!()
        }
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig {
            secondary_timeout_ms: 50,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ensemble_adopts_secondary_above_threshold() {
        let ensemble = EnsembleClassifier::new(&config()).with_secondary(Arc::new(
            FixedSecondary(DomainResult {
                domain: "data".into(),
                confidence: 0.9,
                explanation: "model".into(),
            }),
        ));
        // Primary scores this as security with confidence 1.0.
        let result = ensemble.classify("rotate secrets and encryption keys").await;
        assert_eq!(result.domain, "data");
        assert!(result.confidence > 0.6);
    }

    #[tokio::test]
    async fn ensemble_keeps_primary_below_threshold() {
        let ensemble = EnsembleClassifier::new(&config()).with_secondary(Arc::new(
            FixedSecondary(DomainResult {
                domain: "data".into(),
                confidence: 0.1,
                explanation: "model".into(),
            }),
        ));
        let result = ensemble.classify("rotate secrets and encryption keys").await;
        assert_eq!(result.domain, "security");
    }

    #[tokio::test]
    async fn secondary_failure_never_propagates() {
        let ensemble =
            EnsembleClassifier::new(&config()).with_secondary(Arc::new(FailingSecondary));
        let result = ensemble.classify("rotate secrets").await;
        assert_eq!(result.domain, "security");
    }

    #[tokio::test]
    async fn secondary_timeout_never_propagates() {
        let ensemble =
            EnsembleClassifier::new(&config()).with_secondary(Arc::new(SlowSecondary));
        let result = ensemble.classify("rotate secrets").await;
        assert_eq!(result.domain, "security");
    }
}
