//! Agent registration
//!
//! Referees and players register with their RPC endpoint and receive a
//! stable id (`REF01`, `P01`, ...) and a bearer token. Registration is
//! idempotent per endpoint: re-registering returns the original record, so
//! an agent that restarts keeps its identity.

use std::sync::RwLock;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A registered referee or player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub endpoint: String,
    pub auth_token: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    referees: RwLock<Vec<AgentRecord>>,
    players: RwLock<Vec<AgentRecord>>,
}

fn new_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("tok_{}", suffix)
}

fn register_in(
    list: &RwLock<Vec<AgentRecord>>,
    prefix: &str,
    endpoint: &str,
    display_name: Option<String>,
) -> AgentRecord {
    let mut list = list.write().expect("registry lock poisoned");
    if let Some(existing) = list.iter().find(|r| r.endpoint == endpoint) {
        return existing.clone();
    }
    let record = AgentRecord {
        agent_id: format!("{}{:02}", prefix, list.len() + 1),
        endpoint: endpoint.to_string(),
        auth_token: new_token(),
        display_name,
    };
    list.push(record.clone());
    record
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_referee(&self, endpoint: &str, display_name: Option<String>) -> AgentRecord {
        register_in(&self.referees, "REF", endpoint, display_name)
    }

    pub fn register_player(&self, endpoint: &str, display_name: Option<String>) -> AgentRecord {
        register_in(&self.players, "P", endpoint, display_name)
    }

    pub fn referees(&self) -> Vec<AgentRecord> {
        self.referees.read().expect("registry lock poisoned").clone()
    }

    pub fn players(&self) -> Vec<AgentRecord> {
        self.players.read().expect("registry lock poisoned").clone()
    }

    pub fn player_count(&self) -> usize {
        self.players.read().expect("registry lock poisoned").len()
    }

    pub fn referee_count(&self) -> usize {
        self.referees.read().expect("registry lock poisoned").len()
    }

    /// True when the token belongs to any registered referee.
    pub fn is_referee_token(&self, token: &str) -> bool {
        self.referees
            .read()
            .expect("registry lock poisoned")
            .iter()
            .any(|r| r.auth_token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_and_token_prefix() {
        let registry = AgentRegistry::new();
        let r1 = registry.register_referee("http://ref1/rpc", None);
        let r2 = registry.register_referee("http://ref2/rpc", None);
        let p1 = registry.register_player("http://p1/rpc", Some("alice".into()));

        assert_eq!(r1.agent_id, "REF01");
        assert_eq!(r2.agent_id, "REF02");
        assert_eq!(p1.agent_id, "P01");
        assert!(p1.auth_token.starts_with("tok_"));
        assert_eq!(p1.auth_token.len(), "tok_".len() + 16);
    }

    #[test]
    fn test_registration_idempotent_per_endpoint() {
        let registry = AgentRegistry::new();
        let first = registry.register_player("http://p1/rpc", None);
        let again = registry.register_player("http://p1/rpc", Some("renamed".into()));

        assert_eq!(first.agent_id, again.agent_id);
        assert_eq!(first.auth_token, again.auth_token);
        assert_eq!(registry.player_count(), 1);
    }

    #[test]
    fn test_referee_token_lookup() {
        let registry = AgentRegistry::new();
        let referee = registry.register_referee("http://ref1/rpc", None);
        assert!(registry.is_referee_token(&referee.auth_token));
        assert!(!registry.is_referee_token("tok_bogus"));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let registry = AgentRegistry::new();
        let a = registry.register_player("http://p1/rpc", None);
        let b = registry.register_player("http://p2/rpc", None);
        assert_ne!(a.auth_token, b.auth_token);
    }
}
