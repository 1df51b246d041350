//! Tint overlay node.
//!
//! Wires a ledger store to the block applier and adds the operational
//! pieces around it: TOML configuration, structured logging, Prometheus
//! metrics and JSON block fixtures.

pub mod blocks;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;

pub use blocks::{load_blocks, parse_blocks};
pub use config::{GenesisOverride, NodeConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::OverlayNode;
