//! Metadata payload grammar.
//!
//! A payload is `[opcode][version][body]`. Only the opcode decides whether a
//! payload has a recognized shape; everything after it is a structural
//! constraint checked against the rule set in force at the output's height.
//!
//! | opcode | kind        | body                                   |
//! |--------|-------------|----------------------------------------|
//! | `0x01` | bond lock   | `duration: u16`                        |
//! | `0x02` | bond unlock | `tx_id: [u8; 32]`, `index: u32`        |
//! | `0x03` | vote reveal | `blind_vote: [u8; 32]`, `secret: [u8; 16]` |
//! | `0x04` | proposal fee| `fee: u64`, `proposal: [u8; 20]`       |
//!
//! All integers are big-endian.

use std::fmt;

use thiserror::Error;
use tint_types::{OutputKey, PayloadPosition, RuleSet, TxId};

const HEADER_LEN: usize = 2;

/// The recognized payload shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    BondLock,
    BondUnlock,
    VoteReveal,
    ProposalFee,
}

impl PayloadKind {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0x01 => Some(Self::BondLock),
            0x02 => Some(Self::BondUnlock),
            0x03 => Some(Self::VoteReveal),
            0x04 => Some(Self::ProposalFee),
            _ => None,
        }
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Self::BondLock => 0x01,
            Self::BondUnlock => 0x02,
            Self::VoteReveal => 0x03,
            Self::ProposalFee => 0x04,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            Self::BondLock => 2,
            Self::BondUnlock => 32 + 4,
            Self::VoteReveal => 32 + 16,
            Self::ProposalFee => 8 + 20,
        }
    }

    fn position(&self, rules: &RuleSet) -> PayloadPosition {
        match self {
            Self::BondLock => rules.bond_lock_position,
            Self::BondUnlock => rules.bond_unlock_position,
            Self::VoteReveal => rules.vote_reveal_position,
            Self::ProposalFee => rules.proposal_fee_position,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BondLock => "bond lock",
            Self::BondUnlock => "bond unlock",
            Self::VoteReveal => "vote reveal",
            Self::ProposalFee => "proposal fee",
        };
        f.write_str(name)
    }
}

/// A decoded, structurally valid payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    BondLock {
        version: u8,
        /// Lock length in blocks.
        duration: u16,
    },
    BondUnlock {
        version: u8,
        target: OutputKey,
    },
    VoteReveal {
        version: u8,
        blind_vote_tx_id: TxId,
        secret: [u8; 16],
    },
    ProposalFee {
        version: u8,
        fee: u64,
        proposal_hash: [u8; 20],
    },
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::BondLock { .. } => PayloadKind::BondLock,
            Self::BondUnlock { .. } => PayloadKind::BondUnlock,
            Self::VoteReveal { .. } => PayloadKind::VoteReveal,
            Self::ProposalFee { .. } => PayloadKind::ProposalFee,
        }
    }

    fn version(&self) -> u8 {
        match self {
            Self::BondLock { version, .. }
            | Self::BondUnlock { version, .. }
            | Self::VoteReveal { version, .. }
            | Self::ProposalFee { version, .. } => *version,
        }
    }

    /// Serialize to the wire grammar.
    pub fn encode(&self) -> Vec<u8> {
        let kind = self.kind();
        let mut out = Vec::with_capacity(HEADER_LEN + kind.body_len());
        out.push(kind.opcode());
        out.push(self.version());
        match self {
            Self::BondLock { duration, .. } => out.extend_from_slice(&duration.to_be_bytes()),
            Self::BondUnlock { target, .. } => {
                out.extend_from_slice(target.tx_id.as_bytes());
                out.extend_from_slice(&target.index.to_be_bytes());
            }
            Self::VoteReveal {
                blind_vote_tx_id,
                secret,
                ..
            } => {
                out.extend_from_slice(blind_vote_tx_id.as_bytes());
                out.extend_from_slice(secret);
            }
            Self::ProposalFee {
                fee, proposal_hash, ..
            } => {
                out.extend_from_slice(&fee.to_be_bytes());
                out.extend_from_slice(proposal_hash);
            }
        }
        out
    }
}

/// Structural constraint a recognized payload failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("{kind} payload version {version} is not accepted")]
    UnsupportedVersion { kind: PayloadKind, version: u8 },

    #[error("{kind} payload is {actual} bytes, expected {expected}")]
    BadLength {
        kind: PayloadKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} payload not allowed at output {index} of {count}")]
    Position {
        kind: PayloadKind,
        index: usize,
        count: usize,
    },

    #[error("bond duration {duration} outside {min}..={max}")]
    LockDuration { duration: u16, min: u16, max: u16 },

    #[error("proposal fee {fee} below minimum {min}")]
    FeeTooLow { fee: u64, min: u64 },
}

/// Result of matching a payload against the grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayloadMatch {
    /// Not one of the recognized shapes.
    Unrecognized,
    Recognized(Payload),
    /// A recognized shape that breaks a structural constraint.
    Malformed(PayloadError),
}

/// Match the payload of output `index` (of `count`) against `rules`.
pub fn decode(bytes: &[u8], rules: &RuleSet, index: usize, count: usize) -> PayloadMatch {
    let Some(kind) = bytes.first().copied().and_then(PayloadKind::from_opcode) else {
        return PayloadMatch::Unrecognized;
    };
    match decode_kind(kind, bytes, rules, index, count) {
        Ok(payload) => PayloadMatch::Recognized(payload),
        Err(e) => PayloadMatch::Malformed(e),
    }
}

fn decode_kind(
    kind: PayloadKind,
    bytes: &[u8],
    rules: &RuleSet,
    index: usize,
    count: usize,
) -> Result<Payload, PayloadError> {
    let expected = HEADER_LEN + kind.body_len();
    if bytes.len() != expected {
        return Err(PayloadError::BadLength {
            kind,
            expected,
            actual: bytes.len(),
        });
    }
    let version = bytes[1];
    if !rules.accepts_payload_version(version) {
        return Err(PayloadError::UnsupportedVersion { kind, version });
    }
    if !kind.position(rules).allows(index, count) {
        return Err(PayloadError::Position { kind, index, count });
    }

    let body = &bytes[HEADER_LEN..];
    let payload = match kind {
        PayloadKind::BondLock => {
            let duration = u16::from_be_bytes([body[0], body[1]]);
            if !rules.lock_duration_allowed(duration) {
                return Err(PayloadError::LockDuration {
                    duration,
                    min: rules.min_lock_duration,
                    max: rules.max_lock_duration,
                });
            }
            Payload::BondLock { version, duration }
        }
        PayloadKind::BondUnlock => {
            let tx_id = TxId::new(array(&body[..32]));
            let bond_index = u32::from_be_bytes(array(&body[32..36]));
            Payload::BondUnlock {
                version,
                target: OutputKey::new(tx_id, bond_index),
            }
        }
        PayloadKind::VoteReveal => Payload::VoteReveal {
            version,
            blind_vote_tx_id: TxId::new(array(&body[..32])),
            secret: array(&body[32..48]),
        },
        PayloadKind::ProposalFee => {
            let fee = u64::from_be_bytes(array(&body[..8]));
            if fee < rules.min_proposal_fee {
                return Err(PayloadError::FeeTooLow {
                    fee,
                    min: rules.min_proposal_fee,
                });
            }
            Payload::ProposalFee {
                version,
                fee,
                proposal_hash: array(&body[8..28]),
            }
        }
    };
    Ok(payload)
}

/// Copy a slice whose length the caller already checked into an array.
fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::genesis_rules()
    }

    #[test]
    fn decodes_bond_lock() {
        let bytes = Payload::BondLock {
            version: 1,
            duration: 144,
        }
        .encode();
        assert_eq!(bytes, vec![0x01, 0x01, 0x00, 0x90]);
        assert_eq!(
            decode(&bytes, &rules(), 0, 2),
            PayloadMatch::Recognized(Payload::BondLock {
                version: 1,
                duration: 144
            })
        );
    }

    #[test]
    fn decodes_unlock_target() {
        let target = OutputKey::new(TxId::new([0xaa; 32]), 3);
        let bytes = Payload::BondUnlock { version: 1, target }.encode();
        match decode(&bytes, &rules(), 0, 1) {
            PayloadMatch::Recognized(Payload::BondUnlock { target: t, .. }) => assert_eq!(t, target),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_opcode_and_empty_are_unrecognized() {
        assert_eq!(decode(&[], &rules(), 0, 1), PayloadMatch::Unrecognized);
        assert_eq!(decode(&[0x7f, 1, 2, 3], &rules(), 0, 1), PayloadMatch::Unrecognized);
    }

    #[test]
    fn duration_out_of_range_is_malformed() {
        let too_short = Payload::BondLock {
            version: 1,
            duration: 1,
        }
        .encode();
        assert!(matches!(
            decode(&too_short, &rules(), 0, 1),
            PayloadMatch::Malformed(PayloadError::LockDuration { duration: 1, .. })
        ));

        let too_long = Payload::BondLock {
            version: 1,
            duration: u16::MAX,
        }
        .encode();
        assert!(matches!(
            decode(&too_long, &rules(), 0, 1),
            PayloadMatch::Malformed(PayloadError::LockDuration { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        assert!(matches!(
            decode(&[0x01, 0x01, 0x00], &rules(), 0, 1),
            PayloadMatch::Malformed(PayloadError::BadLength {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn future_version_is_malformed() {
        let bytes = Payload::BondLock {
            version: 2,
            duration: 100,
        }
        .encode();
        assert!(matches!(
            decode(&bytes, &rules(), 0, 1),
            PayloadMatch::Malformed(PayloadError::UnsupportedVersion { version: 2, .. })
        ));
    }

    #[test]
    fn vote_reveal_must_be_last() {
        let bytes = Payload::VoteReveal {
            version: 1,
            blind_vote_tx_id: TxId::new([1; 32]),
            secret: [2; 16],
        }
        .encode();
        assert!(matches!(decode(&bytes, &rules(), 2, 3), PayloadMatch::Recognized(_)));
        assert!(matches!(
            decode(&bytes, &rules(), 0, 3),
            PayloadMatch::Malformed(PayloadError::Position { .. })
        ));
    }

    #[test]
    fn zero_proposal_fee_is_malformed() {
        let bytes = Payload::ProposalFee {
            version: 1,
            fee: 0,
            proposal_hash: [5; 20],
        }
        .encode();
        assert!(matches!(
            decode(&bytes, &rules(), 0, 1),
            PayloadMatch::Malformed(PayloadError::FeeTooLow { fee: 0, min: 1 })
        ));
    }
}
