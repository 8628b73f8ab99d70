//! Allow-list claims.
//!
//! No per-recipient rows are stored for Merkle seasons. The caller supplies
//! the amount and the proof; the leaf is rebuilt from the caller's own
//! address, so a proof can only ever pay its listed recipient. Only the
//! claimed flag is kept.

use std::collections::{BTreeMap, BTreeSet};

use harvest_crypto::merkle::{reward_leaf, verify};
use harvest_types::season::{ClaimMode, Season};
use harvest_types::snapshot::ClaimMark;
use harvest_types::{Address, SeasonIndex, Timestamp};

use crate::strategy::{ClaimRequest, ClaimStrategy, PreparedClaim};
use crate::{LedgerError, Result};

/// Claimed flags per season.
#[derive(Clone, Debug, Default)]
pub struct ClaimedSet {
    claimed: BTreeMap<SeasonIndex, BTreeSet<Address>>,
}

impl ClaimedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks(marks: &[ClaimMark]) -> Self {
        let mut set = Self::default();
        for mark in marks {
            set.claimed
                .entry(mark.season_index)
                .or_default()
                .insert(mark.claimant);
        }
        set
    }

    pub fn has_claimed(&self, season_index: SeasonIndex, claimant: &Address) -> bool {
        self.claimed
            .get(&season_index)
            .is_some_and(|claimants| claimants.contains(claimant))
    }

    /// Every flag, ordered by season then address.
    pub fn marks(&self) -> Vec<ClaimMark> {
        self.claimed
            .iter()
            .flat_map(|(season_index, claimants)| {
                claimants.iter().map(|claimant| ClaimMark {
                    season_index: *season_index,
                    claimant: *claimant,
                })
            })
            .collect()
    }
}

impl ClaimStrategy for ClaimedSet {
    fn prepare(
        &self,
        season: &Season,
        now: Timestamp,
        caller: &Address,
        request: &ClaimRequest,
    ) -> Result<PreparedClaim> {
        let (ClaimMode::Merkle { merkle_root }, ClaimRequest::Merkle { amount, proof }) =
            (season.mode, request)
        else {
            return Err(LedgerError::WrongClaimMode {
                season_index: season.index,
                expected: request.mode_name(),
                actual: season.mode.name(),
            });
        };

        if season.unclaimed_funds_swept || season.is_past_claim_window(now) {
            return Err(LedgerError::ClaimWindowClosed(season.index));
        }
        if self.has_claimed(season.index, caller) {
            return Err(LedgerError::AlreadyClaimed {
                season_index: season.index,
                claimant: *caller,
            });
        }
        if !verify(proof, &merkle_root, &reward_leaf(caller, *amount)) {
            return Err(LedgerError::InvalidProof);
        }

        Ok(PreparedClaim {
            season_index: season.index,
            claimant: *caller,
            destination: *caller,
            amount: *amount,
        })
    }

    fn commit(&mut self, claim: &PreparedClaim) {
        self.claimed
            .entry(claim.season_index)
            .or_default()
            .insert(claim.claimant);
    }
}
