//! Active-agent lookup for the fee-collection cycle.
//!
//! The collection cycle only ever needs one query: the set of agents whose
//! status is `active`, in whatever order the store returns them. A narrow
//! trait keeps the cycle testable and lets dev mode run without MongoDB.

use async_trait::async_trait;
use bson::doc;
use std::sync::RwLock;

use crate::db::mongo::MongoCollection;
use crate::db::schemas::{AgentDoc, AgentStatus};
use crate::types::Result;

/// Source of active agents for a collection cycle
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Fetch all agents with status = active. Ordering is whatever the
    /// underlying store returns; the cycle makes no fairness guarantee.
    async fn active_agents(&self) -> Result<Vec<AgentDoc>>;
}

/// MongoDB-backed agent store
pub struct MongoAgentStore {
    collection: MongoCollection<AgentDoc>,
}

impl MongoAgentStore {
    pub fn new(collection: MongoCollection<AgentDoc>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl AgentStore for MongoAgentStore {
    async fn active_agents(&self) -> Result<Vec<AgentDoc>> {
        self.collection.find_many(doc! { "status": "active" }).await
    }
}

/// In-memory agent store for dev mode and tests
#[derive(Default)]
pub struct MemoryAgentStore {
    agents: RwLock<Vec<AgentDoc>>,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an agent by id
    pub fn put(&self, agent: AgentDoc) {
        let mut agents = self.agents.write().unwrap();
        agents.retain(|a| a.agent_id != agent.agent_id);
        agents.push(agent);
    }
}

#[async_trait]
impl AgentStore for MemoryAgentStore {
    async fn active_agents(&self) -> Result<Vec<AgentDoc>> {
        let agents = self.agents.read().unwrap();
        Ok(agents
            .iter()
            .filter(|a| a.status == AgentStatus::Active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, status: AgentStatus) -> AgentDoc {
        AgentDoc {
            agent_id: id.to_string(),
            wallet_address: format!("0x{}", id),
            status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_memory_store_filters_inactive() {
        let store = MemoryAgentStore::new();
        store.put(agent("a", AgentStatus::Active));
        store.put(agent("b", AgentStatus::Inactive));
        store.put(agent("c", AgentStatus::Active));

        let active = store.active_agents().await.unwrap();
        let ids: Vec<_> = active.iter().map(|a| a.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_memory_store_put_replaces() {
        let store = MemoryAgentStore::new();
        store.put(agent("a", AgentStatus::Active));
        store.put(agent("a", AgentStatus::Inactive));

        let active = store.active_agents().await.unwrap();
        assert!(active.is_empty());
    }
}
