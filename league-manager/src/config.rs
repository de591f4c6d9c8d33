//! Manager configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Configuration for one league manager process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub league_id: String,
    #[serde(default = "default_game_type")]
    pub game_type: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Registration is refused once a league run has started.
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    /// Require a registration token on inbound reports.
    #[serde(default)]
    pub require_auth: bool,
    /// Upper bound on one round, in seconds. A round whose reports have not
    /// all arrived by then is closed anyway.
    #[serde(default = "default_round_timeout")]
    pub round_timeout_sec: f64,
    /// Poll interval while waiting for a round's reports.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_sec: f64,
}

fn default_game_type() -> String {
    "even_odd".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_min_players() -> usize {
    2
}

fn default_round_timeout() -> f64 {
    120.0
}

fn default_poll_interval() -> f64 {
    0.5
}

impl ManagerConfig {
    pub fn new(league_id: impl Into<String>) -> Self {
        Self {
            league_id: league_id.into(),
            game_type: default_game_type(),
            port: default_port(),
            min_players: default_min_players(),
            require_auth: false,
            round_timeout_sec: default_round_timeout(),
            poll_interval_sec: default_poll_interval(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading manager config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing manager config {}", path.display()))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::new("league-2026");
        assert_eq!(config.port, 8000);
        assert_eq!(config.game_type, "even_odd");
        assert_eq!(config.min_players, 2);
        assert!(!config.require_auth);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ManagerConfig =
            serde_json::from_value(serde_json::json!({"league_id": "l1", "port": 9000})).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.round_timeout_sec, 120.0);
    }
}
