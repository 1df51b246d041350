//! Fundamental types for the tint overlay ledger.
//!
//! Shared by every other crate in the workspace: transaction ids and output
//! keys, the output lifecycle (raw, working, finalized), output types, chain
//! parameters and the versioned classification rules.

pub mod error;
pub mod network;
pub mod output;
pub mod output_type;
pub mod params;
pub mod rules;
pub mod tx_id;

pub use error::{FreezeError, TypeError};
pub use network::NetworkId;
pub use output::{FinalizedOutput, RawOutput, WorkingOutput};
pub use output_type::OutputType;
pub use params::ChainParams;
pub use rules::{PayloadPosition, RuleSet, RuleTable};
pub use tx_id::{OutputKey, TxId};

/// Height of a block in the base chain.
pub type BlockHeight = u32;
