//! One fee-collection cycle over the active agent set.
//!
//! Agents are processed sequentially. Any per-agent failure is logged and
//! counted but never aborts the batch, so one agent with a drained reserve
//! or a bad object reference cannot starve the rest.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::HashCache;
use crate::collector::builder::CoSigner;
use crate::db::agents::AgentStore;

/// Periodic work driven by the scheduler
#[async_trait]
pub trait CycleRunner: Send + Sync {
    /// Run one collection pass over all active agents
    async fn run_collection(&self) -> CycleOutcome;

    /// Periodic housekeeping, run every few cycles
    async fn run_maintenance(&self);
}

/// Counters for one completed collection pass
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CycleOutcome {
    /// Active agents considered
    pub attempted: usize,
    /// Withdrawals that reached finality successfully
    pub collected: usize,
    /// Agents missing key material or an object reference
    pub skipped: usize,
    /// Agents whose withdrawal failed
    pub failed: usize,
}

/// Collects the periodic fee from every active agent
pub struct FeeCollector {
    agents: Arc<dyn AgentStore>,
    cosigner: CoSigner,
    cache: Arc<HashCache>,
    fee_amount: u64,
    collection_address: String,
}

impl FeeCollector {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        cosigner: CoSigner,
        cache: Arc<HashCache>,
        fee_amount: u64,
        collection_address: String,
    ) -> Self {
        Self {
            agents,
            cosigner,
            cache,
            fee_amount,
            collection_address,
        }
    }
}

#[async_trait]
impl CycleRunner for FeeCollector {
    async fn run_collection(&self) -> CycleOutcome {
        let agents = match self.agents.active_agents().await {
            Ok(agents) => agents,
            Err(e) => {
                error!(error = %e, "Failed to load active agents, skipping cycle");
                return CycleOutcome::default();
            }
        };

        let mut outcome = CycleOutcome {
            attempted: agents.len(),
            ..Default::default()
        };

        for agent in &agents {
            if !agent.is_collectable() {
                debug!(agent = %agent.agent_id, "Agent not collectable yet, skipping");
                outcome.skipped += 1;
                continue;
            }

            match self
                .cosigner
                .collect(agent, self.fee_amount, &self.collection_address)
                .await
            {
                Ok(()) => {
                    debug!(agent = %agent.agent_id, amount = self.fee_amount, "Fee collected");
                    outcome.collected += 1;
                }
                Err(e) => {
                    warn!(agent = %agent.agent_id, error = %e, "Fee collection failed");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            attempted = outcome.attempted,
            collected = outcome.collected,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Collection cycle complete"
        );

        outcome
    }

    async fn run_maintenance(&self) {
        let evicted = self.cache.sweep();
        let stats = self.cache.stats();
        info!(
            evicted,
            entries = self.cache.len(),
            hits = stats.hits,
            misses = stats.misses,
            "Maintenance: hash cache swept"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::testing::{test_sponsor, ScriptedLedger};
    use crate::db::agents::MemoryAgentStore;
    use crate::db::schemas::{AgentDoc, AgentStatus, KeyMaterial};

    fn collectable(id: &str) -> AgentDoc {
        AgentDoc {
            agent_id: id.to_string(),
            wallet_address: format!("0x{}", id),
            key_material: Some(KeyMaterial::default()),
            ledger_object_id: Some(format!("0xobj-{}", id)),
            status: AgentStatus::Active,
            ..Default::default()
        }
    }

    fn collector(ledger: Arc<ScriptedLedger>, store: Arc<MemoryAgentStore>) -> FeeCollector {
        FeeCollector::new(
            store,
            CoSigner::new(ledger as _, Arc::new(test_sponsor())),
            Arc::new(HashCache::default()),
            100,
            "0xfees".to_string(),
        )
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_batch() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.fail_prepare_for("b");

        let store = Arc::new(MemoryAgentStore::default());
        for id in ["a", "b", "c"] {
            store.put(collectable(id));
        }

        let outcome = collector(Arc::clone(&ledger), store).run_collection().await;
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.collected, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 0);

        // The two surviving agents were submitted
        assert_eq!(ledger.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_incomplete_agents_are_skipped_without_error() {
        let ledger = Arc::new(ScriptedLedger::new());
        let store = Arc::new(MemoryAgentStore::default());

        store.put(collectable("a"));
        store.put(AgentDoc {
            agent_id: "pending".to_string(),
            wallet_address: "0xpending".to_string(),
            status: AgentStatus::Active,
            ..Default::default()
        });

        let outcome = collector(Arc::clone(&ledger), store).run_collection().await;
        assert_eq!(outcome.collected, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);

        // No preparation attempt for the incomplete agent
        assert_eq!(ledger.prepare_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_agent_set_is_a_quiet_cycle() {
        let ledger = Arc::new(ScriptedLedger::new());
        let store = Arc::new(MemoryAgentStore::default());

        let outcome = collector(Arc::clone(&ledger), store).run_collection().await;
        assert_eq!(outcome.attempted, 0);
        assert!(ledger.submissions().is_empty());
    }
}
