use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type BlockHeight = u64;
pub type MaspEpoch = u64;

/// One row of the historical dataset, keyed by `(epoch_number, token_id)`.
///
/// `height` and `timestamp` record where the values were read. A run that
/// catches an epoch before it closes reads it at the tip, so two runs may
/// disagree on them while agreeing on [`EpochRecord::values`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecord {
    #[serde(alias = "masp_epoch")]
    pub epoch_number: MaspEpoch,
    #[serde(alias = "token_address")]
    pub token_id: String,
    pub last_inflation: u128,
    pub last_locked: u128,
    #[serde(default)]
    pub height: Option<BlockHeight>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl EpochRecord {
    pub fn key(&self) -> (MaspEpoch, &str) {
        (self.epoch_number, self.token_id.as_str())
    }

    /// The collected columns, without the read position.
    pub fn values(&self) -> (MaspEpoch, &str, u128, u128) {
        (self.epoch_number, self.token_id.as_str(), self.last_inflation, self.last_locked)
    }
}

/// Reward parameters of a single token at a single height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenRewards {
    pub last_inflation: u128,
    pub last_locked: u128,
}

/// An epoch scheduled for collection together with the height its values are read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochTarget {
    pub masp_epoch: MaspEpoch,
    pub height: BlockHeight,
}

/// How far behind the tip historical queries may reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookBack {
    #[default]
    Unlimited,
    Blocks(u64),
}

impl LookBack {
    /// Oldest height reachable from `tip`.
    pub fn oldest_height(&self, tip: BlockHeight) -> BlockHeight {
        match self {
            LookBack::Unlimited => crate::consts::GENESIS_HEIGHT,
            LookBack::Blocks(n) => tip
                .saturating_sub(*n)
                .max(crate::consts::GENESIS_HEIGHT),
        }
    }

    pub fn allows(&self, tip: BlockHeight, height: BlockHeight) -> bool {
        height >= self.oldest_height(tip)
    }
}

impl fmt::Display for LookBack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookBack::Unlimited => write!(f, "all"),
            LookBack::Blocks(n) => write!(f, "{} blocks", n),
        }
    }
}

impl FromStr for LookBack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "unlimited" => Ok(LookBack::Unlimited),
            s => s
                .parse::<u64>()
                .map(LookBack::Blocks)
                .map_err(|_| format!("Invalid look-back value: '{}'. Use a block count or 'all'", s)),
        }
    }
}
