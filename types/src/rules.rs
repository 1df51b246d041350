//! Versioned consensus rules for payload classification.
//!
//! Payload grammars evolve through governance. Historical transactions must
//! always be judged by the rules in force at their own height, so rule sets
//! are kept side by side in a [`RuleTable`] and selected by activation height.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::BlockHeight;

/// Where in the output list a payload of a given kind may appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadPosition {
    Any,
    First,
    Last,
}

impl PayloadPosition {
    /// Whether output `index` of a transaction with `count` outputs satisfies
    /// this position.
    pub fn allows(&self, index: usize, count: usize) -> bool {
        match self {
            Self::Any => true,
            Self::First => index == 0,
            Self::Last => count > 0 && index == count - 1,
        }
    }
}

/// One generation of classification rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rule-set generation, bumped by each governance activation.
    pub version: u16,
    /// First height at which this rule set applies.
    pub activation_height: BlockHeight,
    /// Highest payload version byte accepted (versions start at 1).
    pub max_payload_version: u8,
    /// Bond lock duration bounds in blocks, inclusive.
    pub min_lock_duration: u16,
    pub max_lock_duration: u16,
    /// Smallest fee a proposal may burn.
    pub min_proposal_fee: u64,
    pub bond_lock_position: PayloadPosition,
    pub bond_unlock_position: PayloadPosition,
    pub vote_reveal_position: PayloadPosition,
    pub proposal_fee_position: PayloadPosition,
}

impl RuleSet {
    /// The initial rule set every network starts from.
    pub fn genesis_rules() -> Self {
        Self {
            version: 1,
            activation_height: 0,
            max_payload_version: 1,
            min_lock_duration: 6,
            max_lock_duration: 52_560, // ~1 year of 10-minute blocks
            min_proposal_fee: 1,
            bond_lock_position: PayloadPosition::Any,
            bond_unlock_position: PayloadPosition::Any,
            vote_reveal_position: PayloadPosition::Last,
            proposal_fee_position: PayloadPosition::Last,
        }
    }

    pub fn accepts_payload_version(&self, version: u8) -> bool {
        (1..=self.max_payload_version).contains(&version)
    }

    pub fn lock_duration_allowed(&self, duration: u16) -> bool {
        (self.min_lock_duration..=self.max_lock_duration).contains(&duration)
    }
}

/// Rule sets ordered by activation height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RuleSet>", into = "Vec<RuleSet>")]
pub struct RuleTable {
    sets: Vec<RuleSet>,
}

impl RuleTable {
    /// Validate and build a rule table.
    ///
    /// The first set must activate at height 0, activation heights and
    /// versions must strictly increase, and every set's bounds must be sane.
    pub fn new(sets: Vec<RuleSet>) -> Result<Self, TypeError> {
        let first = sets
            .first()
            .ok_or_else(|| TypeError::InvalidRuleTable("no rule sets".into()))?;
        if first.activation_height != 0 {
            return Err(TypeError::InvalidRuleTable(format!(
                "first rule set activates at {}, expected 0",
                first.activation_height
            )));
        }
        for pair in sets.windows(2) {
            if pair[1].activation_height <= pair[0].activation_height {
                return Err(TypeError::InvalidRuleTable(format!(
                    "activation heights not increasing: {} then {}",
                    pair[0].activation_height, pair[1].activation_height
                )));
            }
            if pair[1].version <= pair[0].version {
                return Err(TypeError::InvalidRuleTable(format!(
                    "versions not increasing: {} then {}",
                    pair[0].version, pair[1].version
                )));
            }
        }
        for set in &sets {
            if set.min_lock_duration == 0 || set.min_lock_duration > set.max_lock_duration {
                return Err(TypeError::InvalidRuleTable(format!(
                    "rule set {} has lock bounds {}..={}",
                    set.version, set.min_lock_duration, set.max_lock_duration
                )));
            }
            if set.max_payload_version == 0 {
                return Err(TypeError::InvalidRuleTable(format!(
                    "rule set {} accepts no payload version",
                    set.version
                )));
            }
        }
        Ok(Self { sets })
    }

    pub fn single(set: RuleSet) -> Result<Self, TypeError> {
        Self::new(vec![set])
    }

    /// The rule set in force at `height`.
    pub fn active_at(&self, height: BlockHeight) -> &RuleSet {
        let pos = self.sets.partition_point(|s| s.activation_height <= height);
        // `new` guarantees a set activating at 0, so `pos >= 1`.
        &self.sets[pos.saturating_sub(1)]
    }

    pub fn sets(&self) -> &[RuleSet] {
        &self.sets
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            sets: vec![RuleSet::genesis_rules()],
        }
    }
}

impl TryFrom<Vec<RuleSet>> for RuleTable {
    type Error = TypeError;

    fn try_from(sets: Vec<RuleSet>) -> Result<Self, Self::Error> {
        Self::new(sets)
    }
}

impl From<RuleTable> for Vec<RuleSet> {
    fn from(table: RuleTable) -> Self {
        table.sets
    }
}
