//! Network identifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TypeError;

/// Identifies which base chain the overlay is tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production chain.
    Main,
    /// The public test chain.
    Test,
    /// Local regression-test chain.
    Regtest,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Regtest => "regtest",
        }
    }
}

impl FromStr for NetworkId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "test" => Ok(Self::Test),
            "regtest" => Ok(Self::Regtest),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}
