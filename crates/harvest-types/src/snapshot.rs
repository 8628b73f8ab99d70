//! Persisted state layout.
//!
//! The complete externally observable state of a ledger: the season
//! arena, direct reward rows, Merkle claim flags and role membership.

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::reward::RewardRecord;
use crate::season::Season;
use crate::{Address, SeasonIndex};

/// A Merkle-mode claim flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimMark {
    pub season_index: SeasonIndex,
    pub claimant: Address,
}

/// A role membership entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub account: Address,
}

/// Full ledger state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Seasons in index order, starting at 1 with no gaps.
    pub seasons: Vec<Season>,
    /// Reward rows grouped by season, each group in insertion order.
    pub rewards: Vec<RewardRecord>,
    pub merkle_claims: Vec<ClaimMark>,
    /// Role members in grant order.
    pub roles: Vec<RoleGrant>,
}
