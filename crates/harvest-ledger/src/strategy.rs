//! The claim capability shared by direct and allow-list seasons.
//!
//! A season's [`ClaimMode`](harvest_types::season::ClaimMode) selects which
//! implementation handles a claim. Preparation is pure; the ledger applies
//! the season counters and calls [`ClaimStrategy::commit`] only after the
//! payout succeeded.

use harvest_types::season::Season;
use harvest_types::{Address, Amount, Hash, SeasonIndex, Timestamp};

use crate::Result;

/// Mode-specific claim arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimRequest {
    /// Claim the stored reward row of `owner`.
    Direct { owner: Address },
    /// Claim `amount` for the caller against the season root.
    Merkle { amount: Amount, proof: Vec<Hash> },
}

impl ClaimRequest {
    pub fn mode_name(&self) -> &'static str {
        match self {
            ClaimRequest::Direct { .. } => "direct",
            ClaimRequest::Merkle { .. } => "merkle",
        }
    }
}

/// A validated claim, ready to pay out and commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedClaim {
    pub season_index: SeasonIndex,
    /// Identity whose claim flag flips: the row owner or the Merkle caller.
    pub claimant: Address,
    pub destination: Address,
    pub amount: Amount,
}

pub trait ClaimStrategy {
    /// Check every precondition for `caller` claiming under `request`.
    fn prepare(
        &self,
        season: &Season,
        now: Timestamp,
        caller: &Address,
        request: &ClaimRequest,
    ) -> Result<PreparedClaim>;

    /// Record the claim flag. Infallible once prepared.
    fn commit(&mut self, claim: &PreparedClaim);
}
