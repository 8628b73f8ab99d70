//! The atomic operation surface.
//!
//! [`SeasonLedger`] owns every component of the ledger and is the only way
//! to mutate them. Each mutator follows the same shape: check the caller's
//! role, validate against staged copies, move funds through the
//! [`ValueTransfer`] collaborator, and only then commit the staged state
//! and emit the event. Any error leaves the ledger exactly as it was.
//!
//! Callers racing across tasks share one ledger behind
//! `Arc<tokio::sync::Mutex<SeasonLedger<..>>>`; every call runs to
//! completion while holding the lock.

use harvest_access::AccessRegistry;
use harvest_types::access::Role;
use harvest_types::events::{Event, EventKind};
use harvest_types::reward::{RewardAssignment, RewardRecord};
use harvest_types::season::{ClaimMode, Season, SeasonConfig, SeasonPhase};
use harvest_types::snapshot::LedgerSnapshot;
use harvest_types::{Address, Amount, Hash, SeasonIndex, Timestamp};
use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::config::LedgerSettings;
use crate::direct::RewardBook;
use crate::events::EventBus;
use crate::merkle::ClaimedSet;
use crate::registry::SeasonRegistry;
use crate::strategy::{ClaimRequest, ClaimStrategy, PreparedClaim};
use crate::transfer::ValueTransfer;
use crate::{LedgerError, Result};

pub struct SeasonLedger<C, V> {
    access: AccessRegistry,
    seasons: SeasonRegistry,
    rewards: RewardBook,
    merkle_claims: ClaimedSet,
    clock: C,
    vault: V,
    settings: LedgerSettings,
    events: EventBus,
}

impl<C: Clock, V: ValueTransfer> SeasonLedger<C, V> {
    /// Create an empty ledger administered by `admin`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Access`] if `admin` is the zero address
    pub fn new(admin: Address, clock: C, vault: V, settings: LedgerSettings) -> Result<Self> {
        Ok(Self {
            access: AccessRegistry::new(admin)?,
            seasons: SeasonRegistry::new(),
            rewards: RewardBook::new(),
            merkle_claims: ClaimedSet::new(),
            clock,
            vault,
            settings,
            events: EventBus::default(),
        })
    }

    /// Rebuild a ledger from persisted state. The event journal starts empty.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CorruptSnapshot`] if seasons are not contiguous, or a
    ///   row or flag references a missing season or one of the other mode,
    ///   or no non-zero account holds [`Role::Admin`]
    pub fn restore(snapshot: LedgerSnapshot, clock: C, vault: V, settings: LedgerSettings) -> Result<Self> {
        if !snapshot
            .roles
            .iter()
            .any(|grant| grant.role == Role::Admin && !grant.account.is_zero())
        {
            return Err(LedgerError::CorruptSnapshot(
                "no account holds the admin role".to_string(),
            ));
        }
        let seasons = SeasonRegistry::restore(snapshot.seasons)?;

        for record in &snapshot.rewards {
            if !matches!(seasons.get(record.season_index), Some(s) if s.mode == ClaimMode::Direct) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "reward row for {} references season {} which is not a direct season",
                    record.owner, record.season_index
                )));
            }
        }
        for mark in &snapshot.merkle_claims {
            if !matches!(
                seasons.get(mark.season_index),
                Some(Season { mode: ClaimMode::Merkle { .. }, .. })
            ) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "claim flag for {} references season {} which is not an allow-list season",
                    mark.claimant, mark.season_index
                )));
            }
        }

        tracing::info!(
            seasons = seasons.current_index(),
            rewards = snapshot.rewards.len(),
            merkle_claims = snapshot.merkle_claims.len(),
            "ledger restored"
        );

        Ok(Self {
            access: AccessRegistry::from_grants(&snapshot.roles),
            seasons,
            rewards: RewardBook::from_records(snapshot.rewards)?,
            merkle_claims: ClaimedSet::from_marks(&snapshot.merkle_claims),
            clock,
            vault,
            settings,
            events: EventBus::default(),
        })
    }

    /// The full persisted state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            seasons: self.seasons.seasons().to_vec(),
            rewards: self.rewards.records(),
            merkle_claims: self.merkle_claims.marks(),
            roles: self.access.grants(),
        }
    }

    // ---- Reads ----

    pub fn current_season_index(&self) -> SeasonIndex {
        self.seasons.current_index()
    }

    /// Season at `index`; the zero value if it was never opened.
    pub fn season_info(&self, index: SeasonIndex) -> Season {
        self.seasons.info(index)
    }

    /// Lifecycle phase of season `index` right now.
    pub fn season_phase(&self, index: SeasonIndex) -> Option<SeasonPhase> {
        let now = self.clock.now();
        self.seasons.get(index).map(|season| season.phase(now))
    }

    pub fn read_reward(&self, season_index: SeasonIndex, owner: &Address) -> RewardRecord {
        self.rewards.read(season_index, owner)
    }

    pub fn read_reward_by_index(&self, season_index: SeasonIndex, position: u64) -> RewardRecord {
        self.rewards.read_by_index(season_index, position)
    }

    /// Whether `claimant` has claimed in `season_index`, in either mode.
    pub fn has_claimed(&self, season_index: SeasonIndex, claimant: &Address) -> bool {
        match self.seasons.get(season_index).map(|season| season.mode) {
            Some(ClaimMode::Direct) => self.rewards.read(season_index, claimant).claimed,
            Some(ClaimMode::Merkle { .. }) => self.merkle_claims.has_claimed(season_index, claimant),
            None => false,
        }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    pub fn role_members(&self, role: Role) -> &[Address] {
        self.access.members(role)
    }

    /// Audit journal of every event emitted since construction.
    pub fn events(&self) -> &[Event] {
        self.events.journal()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // ---- Roles ----

    /// Returns whether membership changed. Emits only on change.
    pub fn grant_role(&mut self, sender: &Address, role: Role, account: Address) -> Result<bool> {
        let changed = self.access.grant(sender, role, account)?;
        if changed {
            self.emit(EventKind::RoleGranted {
                role,
                account,
                sender: *sender,
            });
        }
        Ok(changed)
    }

    pub fn revoke_role(&mut self, sender: &Address, role: Role, account: &Address) -> Result<bool> {
        let changed = self.access.revoke(sender, role, account)?;
        if changed {
            self.emit(EventKind::RoleRevoked {
                role,
                account: *account,
                sender: *sender,
            });
        }
        Ok(changed)
    }

    pub fn renounce_role(&mut self, sender: &Address, role: Role, account: &Address) -> Result<bool> {
        let changed = self.access.renounce(sender, role, account)?;
        if changed {
            self.emit(EventKind::RoleRevoked {
                role,
                account: *account,
                sender: *sender,
            });
        }
        Ok(changed)
    }

    // ---- Season lifecycle ----

    /// Open the next season. Admin only.
    ///
    /// # Errors
    ///
    /// Role check first, then the lifecycle and argument checks of
    /// [`SeasonRegistry::validate_open`], then
    /// [`LedgerError::InsufficientFunds`] if funded allow-list seasons are
    /// required and the vault cannot cover the declared total.
    pub fn open_season(&mut self, caller: &Address, config: SeasonConfig) -> Result<SeasonIndex> {
        self.access.require(Role::Admin, caller)?;
        let now = self.clock.now();
        let season = self.seasons.validate_open(&config, now)?;

        if matches!(season.mode, ClaimMode::Merkle { .. }) && self.settings.require_funded_merkle_seasons {
            let available = self.vault.balance();
            if available < season.total_rewards {
                return Err(LedgerError::InsufficientFunds {
                    requested: season.total_rewards,
                    available,
                });
            }
        }

        let index = season.index;
        let opened = EventKind::SeasonOpened {
            season_index: index,
            mode: season.mode.name().to_string(),
            claim_window_end: season.claim_window_end,
            total_rewards: season.total_rewards,
        };
        tracing::info!(
            season_index = index,
            mode = season.mode.name(),
            claim_window_end = season.claim_window_end,
            total_rewards = season.total_rewards,
            "season opened"
        );
        self.seasons.commit(season);
        self.events.emit(now, opened);
        Ok(index)
    }

    /// Move the current season's unclaimed residue to its default
    /// destination. Admin only, once per season. Returns the amount swept.
    pub fn sweep_unclaimed(&mut self, caller: &Address) -> Result<Amount> {
        self.access.require(Role::Admin, caller)?;
        let now = self.clock.now();
        let (season, residue) = self.seasons.validate_sweep(now)?;
        let (season_index, destination) = (season.index, season.default_destination);

        self.settle(&destination, residue)?;

        self.seasons.commit(season);
        tracing::info!(season_index, %destination, amount = residue, "unclaimed residue swept");
        self.events.emit(
            now,
            EventKind::UnclaimedSwept {
                season_index,
                destination,
                amount: residue,
            },
        );
        Ok(residue)
    }

    /// Recover float no season can still owe. Admin only, and only once the
    /// current season (if any) is past its claim window and settled.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::PreviousSeasonNotClosed`] / [`LedgerError::UnsweptResidue`]
    /// - [`LedgerError::InvalidDestination`] if `to` is zero
    /// - [`LedgerError::InsufficientFunds`] if `amount` exceeds the vault balance
    pub fn withdraw_excess(&mut self, caller: &Address, to: Address, amount: Amount) -> Result<()> {
        self.access.require(Role::Admin, caller)?;
        let now = self.clock.now();
        self.seasons.require_settled(now)?;
        if to.is_zero() {
            return Err(LedgerError::InvalidDestination);
        }

        self.settle(&to, amount)?;

        tracing::info!(%to, amount, "excess withdrawn");
        self.events.emit(now, EventKind::ExcessWithdrawn { to, amount });
        Ok(())
    }

    // ---- Direct rewards ----

    /// Assign (or replace) `owner`'s reward in the current season. Writer only.
    pub fn add_reward(
        &mut self,
        caller: &Address,
        owner: Address,
        destination: Address,
        amount: Amount,
    ) -> Result<()> {
        self.assign(caller, &[RewardAssignment::new(owner, destination, amount)])
    }

    /// Assign several rewards in one atomic call. Writer only.
    ///
    /// The window is checked once; entries are then applied in order with
    /// the same replace semantics as [`add_reward`](Self::add_reward).
    pub fn add_reward_batch(&mut self, caller: &Address, entries: &[RewardAssignment]) -> Result<()> {
        self.assign(caller, entries)
    }

    fn assign(&mut self, caller: &Address, entries: &[RewardAssignment]) -> Result<()> {
        self.access.require(Role::Writer, caller)?;
        if entries.len() > self.settings.max_batch_size {
            return Err(LedgerError::BatchTooLarge {
                size: entries.len(),
                max: self.settings.max_batch_size,
            });
        }
        let now = self.clock.now();
        let season = self.seasons.require_current()?;

        if season.mode != ClaimMode::Direct {
            return Err(LedgerError::WrongClaimMode {
                season_index: season.index,
                expected: ClaimMode::Direct.name(),
                actual: season.mode.name(),
            });
        }
        if season.phase(now) != SeasonPhase::Open {
            return Err(LedgerError::SeasonClosed(season.index));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let staged = self.rewards.stage(season, entries)?;

        self.rewards.commit(&staged.rows);
        self.seasons.commit(staged.season);
        for (row, replaced) in staged.rows.iter().zip(&staged.replaced) {
            tracing::debug!(
                season_index = row.season_index,
                owner = %row.owner,
                destination = %row.destination,
                amount = row.amount,
                ?replaced,
                "reward assigned"
            );
            self.events.emit(
                now,
                EventKind::RewardAssigned {
                    season_index: row.season_index,
                    owner: row.owner,
                    destination: row.destination,
                    amount: row.amount,
                    replaced: *replaced,
                },
            );
        }
        Ok(())
    }

    // ---- Claims ----

    /// Claim `owner`'s direct reward. Caller must be the owner or the
    /// row's destination; funds go to the destination.
    pub fn claim_reward(&mut self, caller: &Address, owner: Address) -> Result<PreparedClaim> {
        self.claim(caller, ClaimRequest::Direct { owner })
    }

    /// Claim `amount` for the caller in the current allow-list season.
    pub fn claim_with_proof(
        &mut self,
        caller: &Address,
        amount: Amount,
        proof: Vec<Hash>,
    ) -> Result<PreparedClaim> {
        self.claim(caller, ClaimRequest::Merkle { amount, proof })
    }

    /// Claim in the current season through the strategy its mode selects.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoActiveSeason`] before the first season
    /// - Any precondition failure of the selected [`ClaimStrategy`]
    /// - [`LedgerError::InsufficientFunds`] if the payout would exceed the
    ///   season residue or the vault balance
    /// - [`LedgerError::Transfer`] if the payout is refused
    pub fn claim(&mut self, caller: &Address, request: ClaimRequest) -> Result<PreparedClaim> {
        let now = self.clock.now();
        let season = self.seasons.require_current()?.clone();
        let claim = self
            .strategy(&season.mode)
            .prepare(&season, now, caller, &request)?;

        let available = season.residue();
        let mut staged = season;
        staged.claimed_rewards = staged
            .claimed_rewards
            .checked_add(claim.amount)
            .ok_or(LedgerError::Overflow)?;
        if staged.claimed_rewards > staged.total_rewards {
            return Err(LedgerError::InsufficientFunds {
                requested: claim.amount,
                available,
            });
        }

        self.settle(&claim.destination, claim.amount)?;

        self.strategy_mut(&staged.mode).commit(&claim);
        let mode = staged.mode.name();
        self.seasons.commit(staged);
        tracing::info!(
            season_index = claim.season_index,
            claimant = %claim.claimant,
            destination = %claim.destination,
            amount = claim.amount,
            mode,
            "reward claimed"
        );
        self.events.emit(
            now,
            EventKind::RewardClaimed {
                season_index: claim.season_index,
                claimant: claim.claimant,
                destination: claim.destination,
                amount: claim.amount,
            },
        );
        Ok(claim)
    }

    fn strategy(&self, mode: &ClaimMode) -> &dyn ClaimStrategy {
        match mode {
            ClaimMode::Direct => &self.rewards,
            ClaimMode::Merkle { .. } => &self.merkle_claims,
        }
    }

    fn strategy_mut(&mut self, mode: &ClaimMode) -> &mut dyn ClaimStrategy {
        match mode {
            ClaimMode::Direct => &mut self.rewards,
            ClaimMode::Merkle { .. } => &mut self.merkle_claims,
        }
    }

    /// Pay out through the vault. Nothing has been committed yet, so a
    /// failure here aborts the call cleanly.
    fn settle(&mut self, to: &Address, amount: Amount) -> Result<()> {
        let available = self.vault.balance();
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        self.vault.transfer(to, amount).map_err(|err| {
            tracing::warn!(%to, amount, error = %err, "transfer rejected");
            LedgerError::from(err)
        })
    }

    fn emit(&mut self, kind: EventKind) {
        let now = self.clock.now();
        self.events.emit(now, kind);
    }
}
