//! Semantic classification of overlay outputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role an output plays in the overlay ledger.
///
/// Every finalized output carries exactly one of these. `Undefined` only ever
/// exists on a working output that has not been classified yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutputType {
    /// Not yet classified.
    Undefined,
    /// Output of the genesis transaction; creates conserved value.
    GenesisIssuance,
    /// Carries conserved value from the transaction's inputs.
    ValueTransfer,
    /// Plain base-currency output, no conserved value attached.
    BaseCurrencyChange,
    /// Carries a payload that matches no known rule.
    OpaqueMetadata,
    /// Conserved value bonded until a chain height.
    BondLock,
    /// Releases an earlier bond.
    BondUnlock,
    /// Reveals a previously committed blind vote.
    VoteReveal,
    /// Burns conserved value as a proposal fee.
    ProposalFee,
    /// Matched a known payload shape but broke one of its constraints.
    Invalid,
}

impl OutputType {
    /// Whether an output of this type holds conserved value that a later
    /// transaction can spend.
    pub fn carries_conserved_value(&self) -> bool {
        matches!(
            self,
            Self::GenesisIssuance | Self::ValueTransfer | Self::BondLock | Self::BondUnlock
        )
    }

    /// Whether this type was assigned from a metadata payload.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Self::OpaqueMetadata
                | Self::BondLock
                | Self::BondUnlock
                | Self::VoteReveal
                | Self::ProposalFee
        )
    }

    /// Whether this is a valid terminal state for a finalized output.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Undefined | Self::Invalid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::GenesisIssuance => "genesis_issuance",
            Self::ValueTransfer => "value_transfer",
            Self::BaseCurrencyChange => "base_currency_change",
            Self::OpaqueMetadata => "opaque_metadata",
            Self::BondLock => "bond_lock",
            Self::BondUnlock => "bond_unlock",
            Self::VoteReveal => "vote_reveal",
            Self::ProposalFee => "proposal_fee",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
