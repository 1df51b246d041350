//! Output records across their lifecycle.
//!
//! A [`RawOutput`] arrives from the base-chain decoder. Classification works on
//! a [`WorkingOutput`], a write-only builder, which is consumed by
//! [`WorkingOutput::freeze`] into an immutable [`FinalizedOutput`]. Nothing can
//! mutate a finalized output: its fields are private and it exposes no
//! `&mut self` methods.

use serde::{Deserialize, Serialize};

use crate::error::FreezeError;
use crate::output_type::OutputType;
use crate::tx_id::{OutputKey, TxId};
use crate::BlockHeight;

/// A decoded base-chain transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    pub index: u32,
    /// Base-currency value in the chain's smallest unit.
    pub value: u64,
    pub tx_id: TxId,
    #[serde(default, with = "opt_hex")]
    pub locking_script: Option<Vec<u8>>,
    #[serde(default)]
    pub address: Option<String>,
    /// Embedded metadata (e.g. an OP_RETURN payload).
    #[serde(default, with = "opt_hex")]
    pub metadata: Option<Vec<u8>>,
    pub block_height: BlockHeight,
}

impl RawOutput {
    pub fn key(&self) -> OutputKey {
        OutputKey::new(self.tx_id, self.index)
    }
}

/// Fields shared by working and finalized outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct OutputState {
    raw: RawOutput,
    output_type: OutputType,
    lock_threshold: BlockHeight,
    bond_target: Option<OutputKey>,
}

/// Mutable classification state for one output of the transaction under
/// evaluation. Lives only for one classification pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingOutput {
    state: OutputState,
}

impl WorkingOutput {
    /// Start a working output: `Undefined`, no lock, no bond target.
    pub fn from_raw(raw: RawOutput) -> Self {
        Self {
            state: OutputState {
                raw,
                output_type: OutputType::Undefined,
                lock_threshold: 0,
                bond_target: None,
            },
        }
    }

    pub fn raw(&self) -> &RawOutput {
        &self.state.raw
    }

    pub fn key(&self) -> OutputKey {
        self.state.raw.key()
    }

    pub fn index(&self) -> u32 {
        self.state.raw.index
    }

    pub fn value(&self) -> u64 {
        self.state.raw.value
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.state.raw.metadata.as_deref()
    }

    pub fn output_type(&self) -> OutputType {
        self.state.output_type
    }

    pub fn lock_threshold(&self) -> BlockHeight {
        self.state.lock_threshold
    }

    pub fn bond_target(&self) -> Option<OutputKey> {
        self.state.bond_target
    }

    pub fn set_output_type(&mut self, output_type: OutputType) {
        self.state.output_type = output_type;
    }

    pub fn set_lock_threshold(&mut self, threshold: BlockHeight) {
        self.state.lock_threshold = threshold;
    }

    pub fn set_bond_target(&mut self, target: OutputKey) {
        self.state.bond_target = Some(target);
    }

    /// Freeze into an immutable ledger entry.
    ///
    /// Refuses anything that would break the finalized-state invariants:
    /// an unresolved or invalid type, or a lock on a non-bond output.
    pub fn freeze(self) -> Result<FinalizedOutput, FreezeError> {
        let key = self.key();
        let state = self.state;
        match state.output_type {
            OutputType::Undefined => return Err(FreezeError::Undefined(key)),
            OutputType::Invalid => {
                return Err(FreezeError::NotFinal {
                    key,
                    output_type: state.output_type,
                })
            }
            OutputType::BondLock if state.lock_threshold == 0 => {
                return Err(FreezeError::MissingLock(key))
            }
            OutputType::BondLock => {}
            other if state.lock_threshold > 0 => {
                return Err(FreezeError::StrayLock {
                    key,
                    output_type: other,
                    threshold: state.lock_threshold,
                })
            }
            _ => {}
        }
        Ok(FinalizedOutput { state })
    }
}

/// An immutable, committed overlay output. Identity key: `(tx_id, index)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedOutput {
    state: OutputState,
}

impl FinalizedOutput {
    pub fn key(&self) -> OutputKey {
        self.state.raw.key()
    }

    pub fn tx_id(&self) -> TxId {
        self.state.raw.tx_id
    }

    pub fn index(&self) -> u32 {
        self.state.raw.index
    }

    pub fn value(&self) -> u64 {
        self.state.raw.value
    }

    pub fn locking_script(&self) -> Option<&[u8]> {
        self.state.raw.locking_script.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.state.raw.address.as_deref()
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.state.raw.metadata.as_deref()
    }

    pub fn block_height(&self) -> BlockHeight {
        self.state.raw.block_height
    }

    pub fn output_type(&self) -> OutputType {
        self.state.output_type
    }

    /// Height from which a bond becomes spendable; `0` means no lock.
    pub fn lock_threshold(&self) -> BlockHeight {
        self.state.lock_threshold
    }

    /// For a `BondUnlock`, the bond it releases.
    pub fn bond_target(&self) -> Option<OutputKey> {
        self.state.bond_target
    }

    /// Conserved value held by this output (zero for types that carry none).
    pub fn conserved_value(&self) -> u64 {
        if self.state.output_type.carries_conserved_value() {
            self.state.raw.value
        } else {
            0
        }
    }
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&hex::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
