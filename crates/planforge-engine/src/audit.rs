//! Audit log
//!
//! Append-only, safe under concurrent writers. Entries are self-contained
//! (own timestamp and correlation id) and never mutated after the append.

use planforge_core::AuditEntry;
use std::sync::Mutex;

#[derive(Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: AuditEntry) {
        self.entries.lock().expect("audit lock poisoned").push(entry);
    }

    /// Convenience append for coordinator transitions.
    pub fn record(
        &self,
        correlation_id: &str,
        actor: &str,
        action: &str,
        payload: serde_json::Value,
    ) {
        self.append(AuditEntry::new(correlation_id, actor, action, payload));
    }

    /// Point-in-time copy. The log itself stays append-only.
    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit lock poisoned").clone()
    }

    pub fn for_correlation(&self, correlation_id: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .expect("audit lock poisoned")
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON-lines export for operators.
    pub fn to_jsonl(&self) -> String {
        self.snapshot()
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
