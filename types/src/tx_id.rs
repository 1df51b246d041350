//! Transaction identifiers and output keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A 32-byte base-chain transaction id.
///
/// Rendered as 64 lowercase hex characters, which is also its serde form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TxId([u8; 32]);

impl TxId {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Build a tx id from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypeError::InvalidTxId(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(array))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TxId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidTxId(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of a single output: `(tx_id, index)`.
///
/// Ordered by tx id first, then index, so every store iterates outputs in the
/// same order on every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputKey {
    pub tx_id: TxId,
    pub index: u32,
}

impl OutputKey {
    pub const fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_displays_back() {
        let hex_id = "ab".repeat(32);
        let id: TxId = hex_id.parse().unwrap();
        assert_eq!(id.as_bytes(), &[0xab; 32]);
        assert_eq!(id.to_string(), hex_id);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("abcd".parse::<TxId>().is_err());
        assert!("zz".repeat(32).parse::<TxId>().is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = TxId::new([1u8; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: TxId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn output_keys_order_by_tx_then_index() {
        let a = OutputKey::new(TxId::new([1; 32]), 5);
        let b = OutputKey::new(TxId::new([1; 32]), 7);
        let c = OutputKey::new(TxId::new([2; 32]), 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), format!("{}:5", "01".repeat(32)));
    }
}
