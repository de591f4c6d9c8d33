//! Player configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub player_id: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Strategy name resolved through the strategy factory.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Expected token on inbound referee calls, when set.
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_port() -> u16 {
    8201
}

fn default_strategy() -> String {
    "random".to_string()
}

impl PlayerConfig {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            port: default_port(),
            strategy: default_strategy(),
            auth_token: None,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading player config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing player config {}", path.display()))
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
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
        let config = PlayerConfig::new("P01");
        assert_eq!(config.port, 8201);
        assert_eq!(config.strategy, "random");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PlayerConfig =
            serde_json::from_value(serde_json::json!({"player_id": "P07"})).unwrap();
        assert_eq!(config.player_id, "P07");
        assert_eq!(config.strategy, "random");
    }
}
