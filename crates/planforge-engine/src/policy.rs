//! Policy engine
//!
//! Deterministic routing: a fixed-order rule cascade where the first
//! matching rule is terminal. Pure function of its inputs; identical
//! inputs always produce identical output.

use crate::classify::DomainResult;
use planforge_core::{
    AgentMeta, PolicyConfig, PolicyDecision, RiskAssessment, RiskLevel, Route,
};

/// Request context carried through a decision for explanation purposes.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub area: String,
    pub correlation_id: String,
}

#[derive(Clone, Debug, Default)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn decide(
        &self,
        domain_result: &DomainResult,
        candidates: &[AgentMeta],
        ctx: &RequestContext,
    ) -> PolicyDecision {
        let domain_policy = self.config.domain(&domain_result.domain);
        let mut rules = Vec::new();

        // Rule 1: compliance-certified domain below its human-review bar.
        rules.push(format!(
            "compliance-review: domain '{}' certified={} confidence={:.2} threshold={:.2}",
            domain_result.domain,
            domain_policy.requires_compliance,
            domain_result.confidence,
            domain_policy.human_review_threshold,
        ));
        if domain_policy.requires_compliance
            && domain_result.confidence < domain_policy.human_review_threshold
        {
            return PolicyDecision {
                route: Route::Human,
                agent_id: None,
                explanation: format!(
                    "'{}' is a compliance-certified domain and classification confidence \
                     {:.2} is below the review threshold {:.2}; a human reviewer decides",
                    domain_result.domain,
                    domain_result.confidence,
                    domain_policy.human_review_threshold,
                ),
                confidence: domain_result.confidence,
                policy_rules_applied: rules,
                risk_assessment: RiskAssessment {
                    level: RiskLevel::High,
                    reasons: vec![
                        format!("compliance-certified domain '{}'", domain_result.domain),
                        "classification confidence below review threshold".into(),
                    ],
                },
            };
        }

        // Rule 2: global confidence floor. The generic generator takes it
        // regardless of candidates.
        rules.push(format!(
            "confidence-floor: {:.2} vs global minimum {:.2}",
            domain_result.confidence, self.config.min_confidence,
        ));
        if domain_result.confidence < self.config.min_confidence {
            return PolicyDecision {
                route: Route::Llm,
                agent_id: None,
                explanation: format!(
                    "classification confidence {:.2} is below the global minimum {:.2}; \
                     falling back to the generic generator for '{}'",
                    domain_result.confidence, self.config.min_confidence, ctx.area,
                ),
                confidence: domain_result.confidence,
                policy_rules_applied: rules,
                risk_assessment: RiskAssessment {
                    level: RiskLevel::Medium,
                    reasons: vec!["low classification confidence".into()],
                },
            };
        }

        // Rule 3: trust filter. `preferred` is advisory and never consulted.
        let qualified: Vec<&AgentMeta> = candidates
            .iter()
            .filter(|a| a.trust_score >= domain_policy.min_trust)
            .collect();
        rules.push(format!(
            "trust-filter: {}/{} candidates at or above {:.2}",
            qualified.len(),
            candidates.len(),
            domain_policy.min_trust,
        ));
        if qualified.is_empty() {
            return PolicyDecision {
                route: Route::Llm,
                agent_id: None,
                explanation: format!(
                    "no candidate for domain '{}' meets the trust minimum {:.2}; \
                     falling back to the generic generator",
                    domain_result.domain, domain_policy.min_trust,
                ),
                confidence: domain_result.confidence,
                policy_rules_applied: rules,
                risk_assessment: RiskAssessment {
                    level: RiskLevel::Medium,
                    reasons: vec![format!(
                        "{} candidates, none trusted enough",
                        candidates.len()
                    )],
                },
            };
        }

        // Rule 4: highest trust wins; ties break to the lexicographically
        // lowest agent_id so the decision is order-independent.
        let selected = qualified
            .iter()
            .copied()
            .fold(qualified[0], |best, a| {
                if a.trust_score > best.trust_score
                    || (a.trust_score == best.trust_score && a.agent_id < best.agent_id)
                {
                    a
                } else {
                    best
                }
            });
        rules.push(format!(
            "trust-selection: '{}' at {:.2}",
            selected.agent_id, selected.trust_score,
        ));

        PolicyDecision {
            route: Route::Agent,
            agent_id: Some(selected.agent_id.clone()),
            explanation: format!(
                "'{}' selected for '{}': highest qualifying trust {:.2} in domain '{}'",
                selected.agent_id, ctx.area, selected.trust_score, domain_result.domain,
            ),
            confidence: domain_result.confidence,
            policy_rules_applied: rules,
            risk_assessment: RiskAssessment {
                level: RiskLevel::Low,
                reasons: vec!["trusted specialist available".into()],
            },
        }
    }
}
