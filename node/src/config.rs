//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use tint_types::{BlockHeight, ChainParams, NetworkId, RuleTable, TxId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Replaces the network's well-known genesis transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisOverride {
    pub tx_id: TxId,
    pub height: BlockHeight,
}

/// Configuration for a tint node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which base chain to follow.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Threads used to classify independent transactions of a block.
    /// `0` lets rayon pick one per core.
    #[serde(default)]
    pub classification_threads: usize,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis: Option<GenesisOverride>,

    /// Replaces the network's rule table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleTable>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Regtest
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Chain parameters for the configured network with overrides applied.
    pub fn chain_params(&self) -> ChainParams {
        let mut params = ChainParams::for_network(self.network);
        if let Some(genesis) = &self.genesis {
            params.genesis_tx_id = genesis.tx_id;
            params.genesis_height = genesis.height;
        }
        if let Some(rules) = &self.rules {
            params.rules = rules.clone();
        }
        params
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            classification_threads: 0,
            enable_metrics: false,
            genesis: None,
            rules: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_types::RuleSet;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, NetworkId::Regtest);
        assert_eq!(config.classification_threads, 0);
        assert_eq!(config.log_format, "human");
        assert!(config.genesis.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "test"
            classification_threads = 4
            enable_metrics = true
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, NetworkId::Test);
        assert_eq!(config.classification_threads, 4);
        assert!(config.enable_metrics);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn genesis_override_replaces_network_genesis() {
        let toml = format!(
            "[genesis]\ntx_id = \"{}\"\nheight = 42\n",
            "ab".repeat(32)
        );
        let config = NodeConfig::from_toml_str(&toml).expect("should parse");
        let params = config.chain_params();
        assert_eq!(params.genesis_height, 42);
        assert_eq!(params.genesis_tx_id, TxId::new([0xab; 32]));
    }

    #[test]
    fn rule_override_round_trips() {
        let config = NodeConfig {
            rules: Some(RuleTable::single(RuleSet {
                min_lock_duration: 3,
                ..RuleSet::genesis_rules()
            })
            .unwrap()),
            ..NodeConfig::default()
        };
        let parsed = NodeConfig::from_toml_str(&config.to_toml_string()).expect("should parse");
        assert_eq!(parsed.chain_params().rules.active_at(0).min_lock_duration, 3);
    }

    #[test]
    fn invalid_rule_table_is_config_error() {
        let toml = r#"
            [[rules]]
            version = 1
            activation_height = 10
            max_payload_version = 1
            min_lock_duration = 6
            max_lock_duration = 100
            min_proposal_fee = 1
            bond_lock_position = "any"
            bond_unlock_position = "any"
            vote_reveal_position = "last"
            proposal_fee_position = "last"
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/tint.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
