//! Ledger-wide summaries and the state digest.
//!
//! The digest is a Blake2b-256 hash over every finalized output in key order,
//! so two nodes that processed the same blocks produce the same bytes.

use std::collections::BTreeMap;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::Serialize;
use tint_store::OutputStore;
use tint_types::{BlockHeight, FinalizedOutput, OutputType};

use crate::LedgerError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub tip_height: Option<BlockHeight>,
    pub finalized_outputs: u64,
    pub by_type: BTreeMap<OutputType, u64>,
    /// Conserved value held by all finalized outputs, spent or not.
    pub conserved_value: u128,
    /// Hex Blake2b-256 digest of all finalized outputs.
    pub digest: String,
}

/// Collect counts and the digest in one pass over the store.
pub fn summarize<S: OutputStore + ?Sized>(store: &S) -> Result<LedgerSummary, LedgerError> {
    let outputs = store.iter_outputs()?;
    let mut summary = LedgerSummary {
        tip_height: store.tip_height()?,
        finalized_outputs: outputs.len() as u64,
        ..LedgerSummary::default()
    };
    for o in &outputs {
        *summary.by_type.entry(o.output_type()).or_default() += 1;
        summary.conserved_value += u128::from(o.conserved_value());
    }
    summary.digest = hex::encode(digest_outputs(&outputs));
    Ok(summary)
}

/// Blake2b-256 digest of the whole finalized output set.
pub fn ledger_digest<S: OutputStore + ?Sized>(store: &S) -> Result<[u8; 32], LedgerError> {
    Ok(digest_outputs(&store.iter_outputs()?))
}

fn digest_outputs(outputs: &[FinalizedOutput]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update((outputs.len() as u64).to_le_bytes());
    for o in outputs {
        hasher.update(o.tx_id().as_bytes());
        hasher.update(o.index().to_le_bytes());
        hasher.update(o.value().to_le_bytes());
        hasher.update(o.block_height().to_le_bytes());
        hasher.update(o.output_type().as_str().as_bytes());
        hasher.update(o.lock_threshold().to_le_bytes());
        match o.bond_target() {
            Some(t) => {
                hasher.update([1u8]);
                hasher.update(t.tx_id.as_bytes());
                hasher.update(t.index.to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
        update_optional(&mut hasher, o.locking_script());
        update_optional(&mut hasher, o.address().map(str::as_bytes));
        update_optional(&mut hasher, o.metadata());
    }
    hasher.finalize().into()
}

fn update_optional(hasher: &mut Blake2b<U32>, bytes: Option<&[u8]>) {
    match bytes {
        Some(b) => {
            hasher.update((b.len() as u64 + 1).to_le_bytes());
            hasher.update(b);
        }
        None => hasher.update(0u64.to_le_bytes()),
    }
}
