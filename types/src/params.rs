//! Chain parameters: where the overlay starts and which rules it follows.

use serde::{Deserialize, Serialize};

use crate::network::NetworkId;
use crate::rules::{RuleSet, RuleTable};
use crate::tx_id::TxId;
use crate::BlockHeight;

/// Parameters every node evaluating the same chain must agree on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub network: NetworkId,
    /// The single transaction allowed to create conserved value.
    pub genesis_tx_id: TxId,
    /// Height of the block containing the genesis transaction.
    pub genesis_height: BlockHeight,
    /// Classification rules by activation height.
    pub rules: RuleTable,
}

impl ChainParams {
    /// Well-known parameters for a network.
    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Main => Self {
                network,
                genesis_tx_id: TxId::new(MAIN_GENESIS_TX),
                genesis_height: 571_747,
                rules: RuleTable::default(),
            },
            NetworkId::Test => Self {
                network,
                genesis_tx_id: TxId::new(TEST_GENESIS_TX),
                genesis_height: 1_446_300,
                rules: RuleTable::default(),
            },
            NetworkId::Regtest => {
                // Regtest allows very short bonds so tests can cross them quickly.
                let rules = RuleSet {
                    min_lock_duration: 1,
                    ..RuleSet::genesis_rules()
                };
                Self {
                    network,
                    genesis_tx_id: TxId::ZERO,
                    genesis_height: 111,
                    rules: RuleTable::new(vec![rules]).unwrap_or_default(),
                }
            }
        }
    }

    /// Whether `tx_id` at `height` is the designated genesis transaction.
    pub fn is_genesis(&self, tx_id: &TxId, height: BlockHeight) -> bool {
        *tx_id == self.genesis_tx_id && height == self.genesis_height
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::for_network(NetworkId::Regtest)
    }
}

const MAIN_GENESIS_TX: [u8; 32] = [
    0x4b, 0x5f, 0x6e, 0x8d, 0x66, 0x2a, 0x30, 0x15, 0xe3, 0x66, 0xfa, 0x40, 0x69, 0x1a, 0xd4, 0x2d,
    0x0e, 0x2a, 0x3c, 0x0f, 0x49, 0x8e, 0xbe, 0x63, 0x09, 0xd5, 0xd9, 0x81, 0x8c, 0xb4, 0xd3, 0x7a,
];

const TEST_GENESIS_TX: [u8; 32] = [
    0x09, 0xe7, 0x0c, 0xe0, 0xab, 0x7e, 0x4c, 0x7a, 0x34, 0x93, 0x6a, 0x53, 0x41, 0x98, 0x0b, 0x0e,
    0x14, 0x5c, 0x0e, 0x7d, 0x29, 0x75, 0xe9, 0x6e, 0x20, 0xda, 0x02, 0xb4, 0x31, 0x2a, 0x2c, 0x1e,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_requires_matching_height() {
        let params = ChainParams::for_network(NetworkId::Main);
        let id = params.genesis_tx_id;
        assert!(params.is_genesis(&id, params.genesis_height));
        assert!(!params.is_genesis(&id, params.genesis_height + 1));
        assert!(!params.is_genesis(&TxId::new([9; 32]), params.genesis_height));
    }

    #[test]
    fn networks_have_distinct_genesis() {
        let main = ChainParams::for_network(NetworkId::Main);
        let test = ChainParams::for_network(NetworkId::Test);
        let reg = ChainParams::for_network(NetworkId::Regtest);
        assert_ne!(main.genesis_tx_id, test.genesis_tx_id);
        assert_ne!(main.genesis_tx_id, reg.genesis_tx_id);
    }

    #[test]
    fn regtest_allows_one_block_bonds() {
        let params = ChainParams::for_network(NetworkId::Regtest);
        assert!(params.rules.active_at(params.genesis_height).lock_duration_allowed(1));
    }
}
