//! Capability registry
//!
//! Agent cards discovered at startup, keyed by agent name. The registry
//! is read-only after discovery: agents that come up later are picked
//! up on the next start, and agents that go away fail at invocation
//! time instead of here.

use std::collections::HashMap;
use std::sync::Arc;

use switchboard_a2a::{A2aClient, AgentCard};
use tracing::{info, warn};

use crate::error::InitializationError;

#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    cards: HashMap<String, Arc<AgentCard>>,
}

impl CapabilityRegistry {
    /// Fetch the agent card from every address, skipping addresses that
    /// fail with a warning. Discovery fails only when no address yields
    /// a card.
    pub async fn discover(
        client: &A2aClient,
        addresses: &[String],
    ) -> Result<Self, InitializationError> {
        let mut cards = HashMap::new();
        for address in addresses {
            match client.fetch_agent_card(address, None).await {
                Ok(card) => {
                    if cards.contains_key(&card.name) {
                        warn!(
                            "Duplicate agent name '{}' from {}; keeping the later card",
                            card.name, address
                        );
                    }
                    cards.insert(card.name.clone(), Arc::new(card));
                }
                Err(e) => {
                    warn!("Skipping agent at {}: {:#}", address, e);
                }
            }
        }

        if cards.is_empty() {
            return Err(InitializationError::NoAgentsAvailable(addresses.len()));
        }
        info!("Capability registry ready with {} agent(s)", cards.len());
        Ok(Self { cards })
    }

    /// Build a registry from cards already in hand. Used when embedding
    /// the router without network discovery.
    pub fn from_cards(cards: Vec<AgentCard>) -> Self {
        let cards = cards
            .into_iter()
            .map(|card| (card.name.clone(), Arc::new(card)))
            .collect();
        Self { cards }
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentCard>> {
        self.cards.get(name).cloned()
    }

    /// All cards, sorted by name for deterministic iteration.
    pub fn cards(&self) -> Vec<Arc<AgentCard>> {
        let mut cards: Vec<_> = self.cards.values().cloned().collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name));
        cards
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.cards.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
