//! Seasons: one funding and claim cycle each.
//!
//! A season is created once, mutated only by reward assignment, claims and
//! the one-time sweep, and never deleted. Its lifecycle phase is derived
//! from wall-clock comparisons at call time; nothing about the phase is
//! stored except the sweep flag.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Hash, SeasonIndex, Timestamp};

/// How recipients of a season prove their entitlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ClaimMode {
    /// Per-recipient reward rows written by a writer.
    #[default]
    Direct,
    /// Allow-list committed to by a Merkle root; no rows are stored.
    Merkle { merkle_root: Hash },
}

impl ClaimMode {
    pub fn name(&self) -> &'static str {
        match self {
            ClaimMode::Direct => "direct",
            ClaimMode::Merkle { .. } => "merkle",
        }
    }

    pub fn merkle_root(&self) -> Option<&Hash> {
        match self {
            ClaimMode::Direct => None,
            ClaimMode::Merkle { merkle_root } => Some(merkle_root),
        }
    }
}

/// Lifecycle phase of a season at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonPhase {
    /// Writers may assign rewards; claims are not yet accepted.
    Open,
    /// Recipients may claim.
    ClaimWindow,
    /// Claim window is over; residue may be swept.
    Closed,
    /// Residue has been moved to the default destination.
    Swept,
}

/// A season record. The zero value (`Season::default()`) stands in for
/// indices that were never opened.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub index: SeasonIndex,
    /// Receives the unclaimed residue on sweep.
    pub default_destination: Address,
    /// End of the assignment window for direct seasons that have one.
    pub open_window_end: Option<Timestamp>,
    pub claim_window_end: Timestamp,
    /// Sum of all currently assigned (non-overridden) amounts, or the
    /// declared allow-list total for Merkle seasons.
    pub total_rewards: Amount,
    /// Sum of amounts actually paid out.
    pub claimed_rewards: Amount,
    /// Number of distinct owners with a reward row (direct seasons).
    pub reward_count: u64,
    pub unclaimed_funds_swept: bool,
    pub mode: ClaimMode,
}

impl Season {
    /// Whether this is a stored season rather than the zero value.
    pub fn exists(&self) -> bool {
        self.index != 0
    }

    /// Amount assigned but not paid out.
    pub fn residue(&self) -> Amount {
        self.total_rewards.saturating_sub(self.claimed_rewards)
    }

    /// True once nothing more can be owed from this season's float.
    pub fn is_settled(&self) -> bool {
        self.residue() == 0 || self.unclaimed_funds_swept
    }

    /// The claim window is over (`now > claim_window_end`).
    pub fn is_past_claim_window(&self, now: Timestamp) -> bool {
        now > self.claim_window_end
    }

    /// Derive the lifecycle phase at `now`.
    ///
    /// Direct seasons without an open window assign rewards up to
    /// `claim_window_end` and accept claims after it until swept.
    pub fn phase(&self, now: Timestamp) -> SeasonPhase {
        if self.unclaimed_funds_swept {
            return SeasonPhase::Swept;
        }
        match (self.mode, self.open_window_end) {
            (ClaimMode::Direct, Some(open_end)) => {
                if now <= open_end {
                    SeasonPhase::Open
                } else if now <= self.claim_window_end {
                    SeasonPhase::ClaimWindow
                } else {
                    SeasonPhase::Closed
                }
            }
            (ClaimMode::Direct, None) => {
                if now <= self.claim_window_end {
                    SeasonPhase::Open
                } else {
                    SeasonPhase::ClaimWindow
                }
            }
            (ClaimMode::Merkle { .. }, _) => {
                if now <= self.claim_window_end {
                    SeasonPhase::ClaimWindow
                } else {
                    SeasonPhase::Closed
                }
            }
        }
    }
}

/// What a new season distributes and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "allocation")]
pub enum Allocation {
    /// Writers assign rewards row by row; totals start at zero.
    Direct,
    /// A precomputed allow-list with a declared total.
    Merkle {
        merkle_root: Hash,
        total_rewards: Amount,
    },
}

/// Arguments to open a season.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub default_destination: Address,
    #[serde(default)]
    pub open_window_end: Option<Timestamp>,
    pub claim_window_end: Timestamp,
    pub allocation: Allocation,
}

impl SeasonConfig {
    /// A direct season with no separate assignment window.
    pub fn direct(default_destination: Address, claim_window_end: Timestamp) -> Self {
        Self {
            default_destination,
            open_window_end: None,
            claim_window_end,
            allocation: Allocation::Direct,
        }
    }

    /// A direct season with an assignment window followed by a claim window.
    pub fn direct_windowed(
        default_destination: Address,
        open_window_end: Timestamp,
        claim_window_end: Timestamp,
    ) -> Self {
        Self {
            default_destination,
            open_window_end: Some(open_window_end),
            claim_window_end,
            allocation: Allocation::Direct,
        }
    }

    /// A Merkle allow-list season.
    pub fn merkle(
        default_destination: Address,
        claim_window_end: Timestamp,
        merkle_root: Hash,
        total_rewards: Amount,
    ) -> Self {
        Self {
            default_destination,
            open_window_end: None,
            claim_window_end,
            allocation: Allocation::Merkle {
                merkle_root,
                total_rewards,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(open_window_end: Option<Timestamp>, claim_window_end: Timestamp) -> Season {
        Season {
            index: 1,
            default_destination: Address::repeat(9),
            open_window_end,
            claim_window_end,
            ..Season::default()
        }
    }

    #[test]
    fn test_zero_value_season() {
        let season = Season::default();
        assert!(!season.exists());
        assert_eq!(season.residue(), 0);
        assert!(season.is_settled());
        assert_eq!(season.mode, ClaimMode::Direct);
    }

    #[test]
    fn test_windowed_direct_phases() {
        let season = direct(Some(100), 200);
        assert_eq!(season.phase(50), SeasonPhase::Open);
        assert_eq!(season.phase(100), SeasonPhase::Open);
        assert_eq!(season.phase(101), SeasonPhase::ClaimWindow);
        assert_eq!(season.phase(200), SeasonPhase::ClaimWindow);
        assert_eq!(season.phase(201), SeasonPhase::Closed);
    }

    #[test]
    fn test_deferred_direct_phases() {
        let season = direct(None, 200);
        assert_eq!(season.phase(200), SeasonPhase::Open);
        assert_eq!(season.phase(201), SeasonPhase::ClaimWindow);
        assert_eq!(season.phase(10_000), SeasonPhase::ClaimWindow);
    }

    #[test]
    fn test_merkle_phases() {
        let season = Season {
            mode: ClaimMode::Merkle {
                merkle_root: [7u8; 32],
            },
            ..direct(None, 200)
        };
        assert_eq!(season.phase(0), SeasonPhase::ClaimWindow);
        assert_eq!(season.phase(200), SeasonPhase::ClaimWindow);
        assert_eq!(season.phase(201), SeasonPhase::Closed);
    }

    #[test]
    fn test_swept_overrides_time() {
        let mut season = direct(None, 200);
        season.total_rewards = 8;
        season.claimed_rewards = 5;
        assert_eq!(season.residue(), 3);
        assert!(!season.is_settled());

        season.unclaimed_funds_swept = true;
        assert!(season.is_settled());
        assert_eq!(season.phase(201), SeasonPhase::Swept);
        assert_eq!(season.phase(0), SeasonPhase::Swept);
    }

    #[test]
    fn test_claim_mode_accessors() {
        assert_eq!(ClaimMode::Direct.name(), "direct");
        assert!(ClaimMode::Direct.merkle_root().is_none());
        let merkle = ClaimMode::Merkle {
            merkle_root: [1u8; 32],
        };
        assert_eq!(merkle.name(), "merkle");
        assert_eq!(merkle.merkle_root(), Some(&[1u8; 32]));
    }
}
