//! Referee configuration
//!
//! Constructed once at startup and passed into every component; nothing in
//! this crate reads ambient global state.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use league_core::Scoring;
use serde::{Deserialize, Serialize};

/// Per-step timeouts, in seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Bound on the invitation step, per player.
    pub invite_timeout_sec: f64,
    /// Bound on the choice-collection step, per player.
    pub move_timeout_sec: f64,
    /// Bound on the best-effort game-over notification.
    pub notify_timeout_sec: f64,
    /// Bound on the result report to the league manager.
    pub report_timeout_sec: f64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            invite_timeout_sec: 10.0,
            move_timeout_sec: 30.0,
            notify_timeout_sec: 5.0,
            report_timeout_sec: 10.0,
        }
    }
}

/// Full referee configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefereeConfig {
    pub referee_id: String,
    pub league_id: String,
    pub game_type: String,
    pub port: u16,
    /// League manager RPC endpoint for match reports.
    pub manager_endpoint: String,
    /// Player id to RPC endpoint directory.
    #[serde(default)]
    pub player_endpoints: HashMap<String, String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub scoring: Scoring,
}

impl RefereeConfig {
    pub fn new(referee_id: impl Into<String>) -> Self {
        Self {
            referee_id: referee_id.into(),
            league_id: "league-default".to_string(),
            game_type: "even_odd".to_string(),
            port: 8101,
            manager_endpoint: "http://127.0.0.1:8000/rpc".to_string(),
            player_endpoints: HashMap::new(),
            auth_token: None,
            timeouts: TimeoutsConfig::default(),
            scoring: Scoring::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn with_manager_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.manager_endpoint = endpoint.into();
        self
    }

    pub fn with_player_endpoint(
        mut self,
        player_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        self.player_endpoints.insert(player_id.into(), endpoint.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
