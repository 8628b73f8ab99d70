//! Direct-mode reward rows.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, SeasonIndex};

/// A reward row keyed by `(season_index, owner)`.
///
/// The row is stamped with the season it was written for; a row only
/// counts for a season whose index matches the stamp.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub season_index: SeasonIndex,
    pub owner: Address,
    /// Payout target, may differ from `owner`.
    pub destination: Address,
    pub amount: Amount,
    pub claimed: bool,
}

impl RewardRecord {
    pub fn exists(&self) -> bool {
        self.season_index != 0
    }
}

/// One entry of a writer's assignment call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAssignment {
    pub owner: Address,
    pub destination: Address,
    pub amount: Amount,
}

impl RewardAssignment {
    pub fn new(owner: Address, destination: Address, amount: Amount) -> Self {
        Self {
            owner,
            destination,
            amount,
        }
    }
}
