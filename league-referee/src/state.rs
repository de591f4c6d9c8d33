//! Referee process state
//!
//! One `RefereeState` is built at startup and shared (behind an `Arc`) by
//! the RPC handlers and every concurrent match task. The registry and the
//! endpoint directory are the only mutable pieces.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use league_net::{ResilientClient, RetryPolicy};

use crate::config::RefereeConfig;
use crate::orchestrator::MatchOrchestrator;
use crate::registry::MatchRegistry;

/// Player id to RPC endpoint directory, shared across match tasks.
#[derive(Debug, Default)]
pub struct EndpointDirectory {
    endpoints: RwLock<HashMap<String, String>>,
}

impl EndpointDirectory {
    pub fn from_map(endpoints: HashMap<String, String>) -> Self {
        Self {
            endpoints: RwLock::new(endpoints),
        }
    }

    pub fn get(&self, player_id: &str) -> Option<String> {
        self.endpoints
            .read()
            .expect("endpoint lock poisoned")
            .get(player_id)
            .cloned()
    }

    pub fn set(&self, player_id: impl Into<String>, endpoint: impl Into<String>) {
        self.endpoints
            .write()
            .expect("endpoint lock poisoned")
            .insert(player_id.into(), endpoint.into());
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().expect("endpoint lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared state for one referee process.
pub struct RefereeState {
    pub config: RefereeConfig,
    pub registry: Arc<MatchRegistry>,
    pub endpoints: Arc<EndpointDirectory>,
    pub client: Arc<ResilientClient>,
}

impl RefereeState {
    pub fn new(config: RefereeConfig) -> Self {
        let endpoints = Arc::new(EndpointDirectory::from_map(config.player_endpoints.clone()));
        Self {
            registry: Arc::new(MatchRegistry::new()),
            endpoints,
            client: Arc::new(ResilientClient::http(RetryPolicy::default())),
            config,
        }
    }

    /// Orchestrator handle for one match task.
    pub fn orchestrator(&self) -> MatchOrchestrator {
        MatchOrchestrator::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            Arc::clone(&self.endpoints),
            self.config.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_lookup() {
        let dir = EndpointDirectory::default();
        assert!(dir.get("P01").is_none());
        dir.set("P01", "http://127.0.0.1:8201/rpc");
        assert_eq!(dir.get("P01").as_deref(), Some("http://127.0.0.1:8201/rpc"));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_state_seeds_directory_from_config() {
        let config = RefereeConfig::new("REF01")
            .with_player_endpoint("P01", "http://p1/rpc")
            .with_player_endpoint("P02", "http://p2/rpc");
        let state = RefereeState::new(config);
        assert_eq!(state.endpoints.len(), 2);
        assert!(state.registry.is_empty());
    }
}
