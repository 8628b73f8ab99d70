//! Direct-mode reward rows.
//!
//! Rows are keyed by `(season_index, owner)` and enumerable per season in
//! insertion order. Assigning to an owner that already has a row in the
//! season replaces it: the prior amount leaves the season total, the new
//! amount enters it, and the row becomes unclaimed again. Funds already
//! paid for the replaced row are not clawed back and `claimed_rewards`
//! is left untouched.

use std::collections::{BTreeMap, HashMap};

use harvest_types::reward::{RewardAssignment, RewardRecord};
use harvest_types::season::{ClaimMode, Season, SeasonPhase};
use harvest_types::{Address, Amount, SeasonIndex, Timestamp};

use crate::strategy::{ClaimRequest, ClaimStrategy, PreparedClaim};
use crate::{LedgerError, Result};

/// Assignments validated against a season but not yet stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedAssignments {
    /// The season with `total_rewards` and `reward_count` already adjusted.
    pub season: Season,
    /// Rows to write, one per input entry, in input order.
    pub rows: Vec<RewardRecord>,
    /// Amount of the row each entry replaced, if any.
    pub replaced: Vec<Option<Amount>>,
}

#[derive(Clone, Debug, Default)]
pub struct RewardBook {
    records: HashMap<(SeasonIndex, Address), RewardRecord>,
    order: BTreeMap<SeasonIndex, Vec<Address>>,
}

impl RewardBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted rows, grouped by season in insertion order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CorruptSnapshot`] on an unstamped or duplicate row
    pub fn from_records(records: Vec<RewardRecord>) -> Result<Self> {
        let mut book = Self::default();
        for record in records {
            if !record.exists() {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "reward row for {} has no season",
                    record.owner
                )));
            }
            let key = (record.season_index, record.owner);
            if book.records.contains_key(&key) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "duplicate reward row for {} in season {}",
                    record.owner, record.season_index
                )));
            }
            book.insert(record);
        }
        Ok(book)
    }

    /// All rows, season by season, each season in insertion order.
    pub fn records(&self) -> Vec<RewardRecord> {
        self.order
            .iter()
            .flat_map(|(season_index, owners)| {
                owners
                    .iter()
                    .filter_map(move |owner| self.records.get(&(*season_index, *owner)))
            })
            .cloned()
            .collect()
    }

    /// The row for `owner` in `season_index`, or the zero value.
    pub fn read(&self, season_index: SeasonIndex, owner: &Address) -> RewardRecord {
        self.current_record(season_index, owner)
            .cloned()
            .unwrap_or_default()
    }

    /// The `position`-th row assigned in `season_index`, or the zero value.
    pub fn read_by_index(&self, season_index: SeasonIndex, position: u64) -> RewardRecord {
        usize::try_from(position)
            .ok()
            .and_then(|position| self.order.get(&season_index)?.get(position))
            .map(|owner| self.read(season_index, owner))
            .unwrap_or_default()
    }

    /// Number of distinct owners with a row in `season_index`.
    pub fn count(&self, season_index: SeasonIndex) -> usize {
        self.order.get(&season_index).map_or(0, Vec::len)
    }

    /// A row only counts for the season it was stamped with.
    fn current_record(&self, season_index: SeasonIndex, owner: &Address) -> Option<&RewardRecord> {
        self.records
            .get(&(season_index, *owner))
            .filter(|record| record.season_index == season_index)
    }

    /// Validate `entries` against `season` and compute the resulting state.
    ///
    /// Entries are applied in order; a later entry for the same owner
    /// replaces an earlier one within the same call.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidOwner`] / [`LedgerError::InvalidDestination`] on zero addresses
    /// - [`LedgerError::Overflow`] if the season total overflows
    pub fn stage(&self, season: &Season, entries: &[RewardAssignment]) -> Result<StagedAssignments> {
        let mut staged = season.clone();
        let mut pending: HashMap<Address, RewardRecord> = HashMap::new();
        let mut rows = Vec::with_capacity(entries.len());
        let mut replaced = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.owner.is_zero() {
                return Err(LedgerError::InvalidOwner);
            }
            if entry.destination.is_zero() {
                return Err(LedgerError::InvalidDestination);
            }

            let prior_amount = pending
                .get(&entry.owner)
                .or_else(|| self.current_record(season.index, &entry.owner))
                .map(|prior| prior.amount);

            match prior_amount {
                Some(prior) => {
                    staged.total_rewards = staged
                        .total_rewards
                        .checked_sub(prior)
                        .ok_or(LedgerError::Overflow)?;
                }
                None => staged.reward_count += 1,
            }
            staged.total_rewards = staged
                .total_rewards
                .checked_add(entry.amount)
                .ok_or(LedgerError::Overflow)?;

            let row = RewardRecord {
                season_index: season.index,
                owner: entry.owner,
                destination: entry.destination,
                amount: entry.amount,
                claimed: false,
            };
            pending.insert(entry.owner, row.clone());
            rows.push(row);
            replaced.push(prior_amount);
        }

        Ok(StagedAssignments {
            season: staged,
            rows,
            replaced,
        })
    }

    /// Store staged rows.
    pub fn commit(&mut self, rows: &[RewardRecord]) {
        for row in rows {
            self.insert(row.clone());
        }
    }

    fn insert(&mut self, record: RewardRecord) {
        let key = (record.season_index, record.owner);
        if self.records.insert(key, record).is_none() {
            self.order.entry(key.0).or_default().push(key.1);
        }
    }
}

impl ClaimStrategy for RewardBook {
    fn prepare(
        &self,
        season: &Season,
        now: Timestamp,
        caller: &Address,
        request: &ClaimRequest,
    ) -> Result<PreparedClaim> {
        let (ClaimMode::Direct, ClaimRequest::Direct { owner }) = (season.mode, request) else {
            return Err(LedgerError::WrongClaimMode {
                season_index: season.index,
                expected: request.mode_name(),
                actual: season.mode.name(),
            });
        };

        match season.phase(now) {
            SeasonPhase::Open => return Err(LedgerError::SeasonNotYetClaimable(season.index)),
            SeasonPhase::ClaimWindow => {}
            SeasonPhase::Closed | SeasonPhase::Swept => {
                return Err(LedgerError::ClaimWindowClosed(season.index))
            }
        }

        let record = self
            .current_record(season.index, owner)
            .ok_or(LedgerError::RewardNotFound {
                season_index: season.index,
                owner: *owner,
            })?;
        if record.claimed {
            return Err(LedgerError::AlreadyClaimed {
                season_index: season.index,
                claimant: *owner,
            });
        }
        if caller != owner && *caller != record.destination {
            return Err(LedgerError::NotAuthorized { caller: *caller });
        }

        Ok(PreparedClaim {
            season_index: season.index,
            claimant: *owner,
            destination: record.destination,
            amount: record.amount,
        })
    }

    fn commit(&mut self, claim: &PreparedClaim) {
        if let Some(record) = self.records.get_mut(&(claim.season_index, claim.claimant)) {
            record.claimed = true;
        }
    }
}
