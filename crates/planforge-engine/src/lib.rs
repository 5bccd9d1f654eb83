//! Planforge Engine - the orchestration kernel
//!
//! Turns a batch of enhancement areas into a validated, dependency-ordered
//! manifest: classify → route → generate → duplicate-check → graph-build,
//! with an audit entry for every transition.

pub mod audit;
pub mod classify;
pub mod contract;
pub mod coordinator;
pub mod dedup;
pub mod escalate;
pub mod graph;
pub mod policy;
pub mod registry;

pub use audit::AuditLog;
pub use classify::{DomainClassifier, DomainResult, EnsembleClassifier, SecondaryClassifier};
pub use contract::ContractGenerator;
pub use coordinator::{
    AreaResolution, AreaStatus, Coordinator, DelegationRecord, ValidationReport,
};
pub use dedup::{DuplicateChecker, Verdict};
pub use escalate::{AuditEscalator, EscalationSink};
pub use graph::{build as build_graph, build_pairs};
pub use policy::{PolicyEngine, RequestContext};
pub use registry::AgentRegistry;
pub use tokio_util::sync::CancellationToken;
