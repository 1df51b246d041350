//! Units of work written to an [`OutputStore`](crate::OutputStore).

use serde::{Deserialize, Serialize};
use tint_types::{BlockHeight, FinalizedOutput, OutputKey, TxId};

/// Everything one accepted transaction adds to the ledger.
///
/// Backends must apply a `TxCommit` atomically: either every output lands,
/// or none does.
#[derive(Clone, Debug)]
pub struct TxCommit {
    pub tx_id: TxId,
    /// Height of the block being processed when the commit happened.
    pub height: BlockHeight,
    pub outputs: Vec<FinalizedOutput>,
    /// Conserved value left unassigned by the transaction.
    pub forfeited: u64,
    /// Conserved value burnt explicitly (proposal fees).
    pub burnt: u64,
}

impl TxCommit {
    pub fn record(&self) -> CommitRecord {
        CommitRecord {
            tx_id: self.tx_id,
            height: self.height,
            output_keys: self.outputs.iter().map(FinalizedOutput::key).collect(),
            forfeited: self.forfeited,
            burnt: self.burnt,
        }
    }
}

/// The bookkeeping kept per committed transaction, used to undo whole blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub tx_id: TxId,
    pub height: BlockHeight,
    pub output_keys: Vec<OutputKey>,
    pub forfeited: u64,
    pub burnt: u64,
}
