//! Tests for planforge-core: serde round trips and the manifest envelope

use planforge_core::*;

fn contract(name: &str) -> AgentContract {
    AgentContract {
        enhancement_area: name.into(),
        objective: "do the thing".into(),
        implementation_plan: ImplementationPlan {
            modules: vec!["m1".into(), "m2".into()],
            architecture: "layered".into(),
        },
        depends_on: vec!["other".into()],
        sources: vec!["rfc-17".into()],
        governance: Governance {
            security: "-".into(),
            compliance: "-".into(),
            ethics: "-".into(),
        },
        validation_criteria: vec!["it works".into()],
        confidence_score: 0.85,
    }
}

#[test]
fn contract_round_trips() {
    let original = contract("caching");
    let json = serde_json::to_string(&original).unwrap();
    let back: AgentContract = serde_json::from_str(&json).unwrap();
    assert_eq!(original, back);
}

#[test]
fn area_defaults_optional_lists() {
    let area: EnhancementArea =
        serde_json::from_str(r#"{"name": "a", "objective": "b"}"#).unwrap();
    assert!(area.key_requirements.is_empty());
    assert!(area.depends_on.is_empty());
}

#[test]
fn manifest_envelope_counts_and_lookup() {
    let contracts = vec![contract("a"), contract("b")];
    let graph = DependencyGraph {
        nodes: vec!["a".into(), "b".into()],
        edges: vec![],
        build_order: vec!["a".into(), "b".into()],
    };
    let manifest = Manifest::new(
        "0.3.0",
        "staging",
        BatchCounts {
            received: 3,
            accepted: 2,
            rejected: 1,
            escalated: 0,
        },
        contracts,
        graph,
    );

    assert_eq!(manifest.environment, "staging");
    assert!(manifest.contract("a").is_some());
    assert!(manifest.contract("missing").is_none());

    let json = serde_json::to_string(&manifest).unwrap();
    let back: Manifest = serde_json::from_str(&json).unwrap();
    assert_eq!(back.counts.accepted, 2);
    assert_eq!(back.roadmap.build_order, vec!["a", "b"]);
}

#[test]
fn audit_entry_builders() {
    let entry = AuditEntry::new("c1", "policy", "decided", serde_json::json!({"route": "llm"}))
        .with_duration(42)
        .with_meta("batch", "b-1");
    assert_eq!(entry.duration_ms, Some(42));
    assert_eq!(entry.metadata["batch"], "b-1");

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["payload"]["route"], "llm");
    assert_eq!(json["duration_ms"], 42);
}

#[test]
fn policy_decision_serializes_without_empty_agent() {
    let decision = PolicyDecision {
        route: Route::Llm,
        agent_id: None,
        explanation: "low confidence".into(),
        confidence: 0.3,
        policy_rules_applied: vec!["confidence-floor".into()],
        risk_assessment: RiskAssessment {
            level: RiskLevel::Medium,
            reasons: vec![],
        },
    };
    let json = serde_json::to_value(&decision).unwrap();
    assert!(json.get("agent_id").is_none());
    assert_eq!(json["route"], "llm");
    assert_eq!(json["risk_assessment"]["level"], "medium");
}
