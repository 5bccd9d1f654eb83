//! Agent registry
//!
//! In-memory catalog of candidate workers. Persistence is an external
//! concern; a process loads its roster at startup.

use dashmap::DashMap;
use planforge_core::{AgentMeta, Error, Result};

#[derive(Default)]
pub struct AgentRegistry {
    agents: DashMap<String, AgentMeta>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert keyed by agent_id.
    pub fn register(&self, meta: AgentMeta) -> Result<()> {
        if meta.agent_id.trim().is_empty() {
            return Err(Error::validation("agent", "agent_id is required"));
        }
        self.agents.insert(meta.agent_id.clone(), meta);
        Ok(())
    }

    pub fn unregister(&self, agent_id: &str) -> Result<AgentMeta> {
        self.agents
            .remove(agent_id)
            .map(|(_, meta)| meta)
            .ok_or_else(|| Error::NotFound(format!("agent '{}'", agent_id)))
    }

    pub fn get(&self, agent_id: &str) -> Result<AgentMeta> {
        self.agents
            .get(agent_id)
            .map(|r| r.clone())
            .ok_or_else(|| Error::NotFound(format!("agent '{}'", agent_id)))
    }

    /// All agents whose domain list includes `domain`, ordered by agent_id
    /// for determinism.
    pub fn list_by_domain(&self, domain: &str) -> Vec<AgentMeta> {
        let mut agents: Vec<AgentMeta> = self
            .agents
            .iter()
            .filter(|r| r.domains.iter().any(|d| d == domain))
            .map(|r| r.clone())
            .collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        agents
    }

    /// Set an agent's trust score, clamped to [0, 1].
    pub fn set_trust_score(&self, agent_id: &str, score: f64) -> Result<()> {
        let mut entry = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| Error::NotFound(format!("agent '{}'", agent_id)))?;
        entry.trust_score = score.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_agent_id() {
        let reg = AgentRegistry::new();
        let err = reg.register(AgentMeta::new("", 0.5)).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn register_is_idempotent_upsert() {
        let reg = AgentRegistry::new();
        reg.register(AgentMeta::new("a1", 0.5)).unwrap();
        reg.register(AgentMeta::new("a1", 0.8)).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a1").unwrap().trust_score, 0.8);
    }

    #[test]
    fn unknown_agent_is_not_found() {
        let reg = AgentRegistry::new();
        assert_eq!(reg.get("ghost").unwrap_err().kind(), "not_found");
        assert_eq!(reg.unregister("ghost").unwrap_err().kind(), "not_found");
        assert_eq!(
            reg.set_trust_score("ghost", 0.5).unwrap_err().kind(),
            "not_found"
        );
    }

    #[test]
    fn trust_score_clamps() {
        let reg = AgentRegistry::new();
        reg.register(AgentMeta::new("a1", 0.5)).unwrap();
        reg.set_trust_score("a1", 7.0).unwrap();
        assert_eq!(reg.get("a1").unwrap().trust_score, 1.0);
        reg.set_trust_score("a1", -1.0).unwrap();
        assert_eq!(reg.get("a1").unwrap().trust_score, 0.0);
    }

    #[test]
    fn list_by_domain_is_sorted_and_filtered() {
        let reg = AgentRegistry::new();
        reg.register(AgentMeta::new("zeta", 0.9).with_domains(&["security"]))
            .unwrap();
        reg.register(AgentMeta::new("alpha", 0.7).with_domains(&["security", "data"]))
            .unwrap();
        reg.register(AgentMeta::new("other", 0.8).with_domains(&["api"]))
            .unwrap();

        let security = reg.list_by_domain("security");
        let ids: Vec<&str> = security.iter().map(|a| a.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
        assert!(reg.list_by_domain("frontend").is_empty());
    }
}
