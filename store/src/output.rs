//! Finalized output storage trait.

use crate::{CommitRecord, StoreError, TxCommit};
use tint_types::{BlockHeight, FinalizedOutput, OutputKey, OutputType, TxId};

/// Append-only, key-unique store of finalized outputs indexed by
/// `(tx_id, index)`.
///
/// Implementations must be safe to share between threads; commits for
/// different transactions may arrive from different threads but the caller
/// serializes them in block order.
pub trait OutputStore: Send + Sync {
    /// Retrieve a finalized output.
    fn get_output(&self, key: &OutputKey) -> Result<Option<FinalizedOutput>, StoreError>;

    /// Check if an output has been finalized.
    fn exists(&self, key: &OutputKey) -> Result<bool, StoreError> {
        Ok(self.get_output(key)?.is_some())
    }

    /// All finalized outputs of a given type, in key order.
    fn outputs_by_type(&self, output_type: OutputType) -> Result<Vec<FinalizedOutput>, StoreError>;

    /// All finalized outputs of a transaction, in index order.
    fn outputs_of_tx(&self, tx_id: &TxId) -> Result<Vec<FinalizedOutput>, StoreError>;

    /// The finalized `BondUnlock` that releases `bond`, if any.
    fn unlock_for(&self, bond: &OutputKey) -> Result<Option<OutputKey>, StoreError>;

    /// Atomically insert every output of one transaction.
    ///
    /// Fails with [`StoreError::Duplicate`] and writes nothing if any key is
    /// already present or repeats inside the commit.
    fn commit_tx(&self, commit: &TxCommit) -> Result<(), StoreError>;

    /// Commit records for a height, in commit order.
    fn commits_at(&self, height: BlockHeight) -> Result<Vec<CommitRecord>, StoreError>;

    /// Remove everything committed at `height`, returning what was removed.
    fn remove_height(&self, height: BlockHeight) -> Result<Vec<CommitRecord>, StoreError>;

    /// Every finalized output, in key order.
    fn iter_outputs(&self) -> Result<Vec<FinalizedOutput>, StoreError>;

    /// Total number of finalized outputs.
    fn output_count(&self) -> Result<u64, StoreError>;

    /// Highest height with at least one commit.
    fn tip_height(&self) -> Result<Option<BlockHeight>, StoreError>;
}
