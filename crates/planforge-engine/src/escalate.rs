//! Human-review escalation sink
//!
//! Fire-and-forget: the reviewing workflow itself is out of scope. The
//! default sink records the hand-off in the audit log.

use crate::audit::AuditLog;
use planforge_core::EnhancementArea;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[async_trait::async_trait]
pub trait EscalationSink: Send + Sync {
    async fn escalate(&self, area: &EnhancementArea, reason: &str);
}

/// Default sink: audit entry + warning log.
pub struct AuditEscalator {
    audit: Arc<AuditLog>,
}

impl AuditEscalator {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self { audit }
    }
}

#[async_trait::async_trait]
impl EscalationSink for AuditEscalator {
    async fn escalate(&self, area: &EnhancementArea, reason: &str) {
        warn!(area = %area.name, reason, "escalated to human review");
        self.audit.record(
            &format!("escalation:{}", area.name),
            "escalator",
            "escalated",
            json!({ "area": area.name, "reason": reason }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn escalation_is_recorded() {
        let audit = Arc::new(AuditLog::new());
        let sink = AuditEscalator::new(audit.clone());
        sink.escalate(
            &EnhancementArea::new("payments", "Rework settlement"),
            "compliance domain below review threshold",
        )
        .await;

        let entries = audit.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "escalated");
        assert_eq!(entries[0].payload["area"], "payments");
    }
}
