//! Season arena and lifecycle validation.
//!
//! Seasons live in an append-only vector: index `i` is stored at `i - 1`.
//! Validation methods return staged copies; nothing changes until
//! [`SeasonRegistry::commit`] is called.

use harvest_types::season::{Allocation, ClaimMode, Season, SeasonConfig};
use harvest_types::{
    Amount, SeasonIndex, Timestamp, FIRST_SEASON_INDEX, MAX_TIMESTAMP, ZERO_HASH,
};

use crate::{LedgerError, Result};

#[derive(Clone, Debug, Default)]
pub struct SeasonRegistry {
    seasons: Vec<Season>,
}

impl SeasonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted seasons.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CorruptSnapshot`] if indices are not `1..=n` in order
    pub fn restore(seasons: Vec<Season>) -> Result<Self> {
        for (position, season) in seasons.iter().enumerate() {
            let expected = position as SeasonIndex + FIRST_SEASON_INDEX;
            if season.index != expected {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "season at position {position} has index {}, expected {expected}",
                    season.index
                )));
            }
        }
        Ok(Self { seasons })
    }

    /// Index of the latest season, 0 if none was ever opened.
    pub fn current_index(&self) -> SeasonIndex {
        self.seasons.len() as SeasonIndex
    }

    pub fn get(&self, index: SeasonIndex) -> Option<&Season> {
        let position = index.checked_sub(FIRST_SEASON_INDEX)?;
        self.seasons.get(usize::try_from(position).ok()?)
    }

    /// The season at `index`, or the zero value if there is none.
    pub fn info(&self, index: SeasonIndex) -> Season {
        self.get(index).cloned().unwrap_or_default()
    }

    pub fn current(&self) -> Option<&Season> {
        self.seasons.last()
    }

    /// The current season, for operations that need one.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoActiveSeason`] before the first season
    pub fn require_current(&self) -> Result<&Season> {
        self.current().ok_or(LedgerError::NoActiveSeason)
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Check that the current season is over and owes nothing more.
    ///
    /// Passes trivially when no season exists.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::PreviousSeasonNotClosed`] while `now <= claim_window_end`
    /// - [`LedgerError::UnsweptResidue`] if residue remains and was not swept
    pub fn require_settled(&self, now: Timestamp) -> Result<()> {
        let Some(previous) = self.current() else {
            return Ok(());
        };
        if !previous.is_past_claim_window(now) {
            return Err(LedgerError::PreviousSeasonNotClosed(previous.index));
        }
        if !previous.is_settled() {
            return Err(LedgerError::UnsweptResidue {
                season_index: previous.index,
                residue: previous.residue(),
            });
        }
        Ok(())
    }

    /// Validate `config` and build the next season. Does not store it.
    ///
    /// # Errors
    ///
    /// In order: [`LedgerError::PreviousSeasonNotClosed`],
    /// [`LedgerError::UnsweptResidue`], [`LedgerError::InvalidDestination`],
    /// [`LedgerError::InvalidWindow`], [`LedgerError::InvalidTotal`],
    /// [`LedgerError::InvalidRoot`].
    pub fn validate_open(&self, config: &SeasonConfig, now: Timestamp) -> Result<Season> {
        self.require_settled(now)?;

        if config.default_destination.is_zero() {
            return Err(LedgerError::InvalidDestination);
        }

        if config.claim_window_end <= now {
            return Err(LedgerError::InvalidWindow(format!(
                "claim window end {} is not after now ({now})",
                config.claim_window_end
            )));
        }
        if config.claim_window_end > MAX_TIMESTAMP {
            return Err(LedgerError::InvalidWindow(format!(
                "claim window end {} exceeds {MAX_TIMESTAMP}",
                config.claim_window_end
            )));
        }
        if let Some(open_end) = config.open_window_end {
            if matches!(config.allocation, Allocation::Merkle { .. }) {
                return Err(LedgerError::InvalidWindow(
                    "allow-list seasons have no assignment window".to_string(),
                ));
            }
            if open_end >= config.claim_window_end {
                return Err(LedgerError::InvalidWindow(format!(
                    "open window end {open_end} must precede claim window end {}",
                    config.claim_window_end
                )));
            }
        }

        let (mode, total_rewards) = match config.allocation {
            Allocation::Direct => (ClaimMode::Direct, 0),
            Allocation::Merkle {
                merkle_root,
                total_rewards,
            } => {
                if total_rewards == 0 {
                    return Err(LedgerError::InvalidTotal);
                }
                if merkle_root == ZERO_HASH {
                    return Err(LedgerError::InvalidRoot);
                }
                (ClaimMode::Merkle { merkle_root }, total_rewards)
            }
        };

        Ok(Season {
            index: self.current_index() + 1,
            default_destination: config.default_destination,
            open_window_end: config.open_window_end,
            claim_window_end: config.claim_window_end,
            total_rewards,
            claimed_rewards: 0,
            reward_count: 0,
            unclaimed_funds_swept: false,
            mode,
        })
    }

    /// Validate a sweep of the current season. Returns the staged season
    /// and the residue to move.
    ///
    /// # Errors
    ///
    /// In order: [`LedgerError::NoActiveSeason`],
    /// [`LedgerError::ClaimWindowOpen`], [`LedgerError::AlreadySwept`],
    /// [`LedgerError::NothingToSweep`].
    pub fn validate_sweep(&self, now: Timestamp) -> Result<(Season, Amount)> {
        let season = self.require_current()?;
        if !season.is_past_claim_window(now) {
            return Err(LedgerError::ClaimWindowOpen(season.index));
        }
        if season.unclaimed_funds_swept {
            return Err(LedgerError::AlreadySwept(season.index));
        }
        let residue = season.residue();
        if residue == 0 {
            return Err(LedgerError::NothingToSweep(season.index));
        }

        let mut staged = season.clone();
        staged.unclaimed_funds_swept = true;
        Ok((staged, residue))
    }

    /// Store a staged season: append a new index or replace the current one.
    pub fn commit(&mut self, season: Season) {
        match self.seasons.last_mut() {
            Some(current) if current.index == season.index => *current = season,
            _ => self.seasons.push(season),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_types::Address;

    const DEST: Address = Address::repeat(0xDE);

    fn opened(registry: &mut SeasonRegistry, config: SeasonConfig, now: Timestamp) -> Season {
        let season = registry.validate_open(&config, now).expect("open");
        registry.commit(season.clone());
        season
    }

    #[test]
    fn test_zero_value_info() {
        let registry = SeasonRegistry::new();
        assert_eq!(registry.current_index(), 0);
        assert_eq!(registry.info(0), Season::default());
        assert_eq!(registry.info(7), Season::default());
        assert!(registry.current().is_none());
        assert_eq!(registry.require_current().err(), Some(LedgerError::NoActiveSeason));
    }

    #[test]
    fn test_open_assigns_sequential_indices() {
        let mut registry = SeasonRegistry::new();
        let first = opened(&mut registry, SeasonConfig::direct(DEST, 100), 0);
        assert_eq!(first.index, 1);
        assert_eq!(first.total_rewards, 0);
        assert!(!first.unclaimed_funds_swept);

        let second = opened(&mut registry, SeasonConfig::direct(DEST, 300), 101);
        assert_eq!(second.index, 2);
        assert_eq!(registry.current_index(), 2);
        assert_eq!(registry.info(1), first);
    }

    #[test]
    fn test_open_validation_order() {
        let mut registry = SeasonRegistry::new();
        let mut season = opened(&mut registry, SeasonConfig::direct(DEST, 100), 0);
        season.total_rewards = 8;
        season.claimed_rewards = 5;
        registry.commit(season);

        // Previous window still open wins over every argument error.
        let bad = SeasonConfig::merkle(Address::ZERO, 0, ZERO_HASH, 0);
        assert_eq!(
            registry.validate_open(&bad, 100).err(),
            Some(LedgerError::PreviousSeasonNotClosed(1))
        );
        assert_eq!(
            registry.validate_open(&bad, 101).err(),
            Some(LedgerError::UnsweptResidue {
                season_index: 1,
                residue: 3
            })
        );
    }

    #[test]
    fn test_open_argument_errors() {
        let registry = SeasonRegistry::new();
        let now = 1_000;
        let check = |config: SeasonConfig| registry.validate_open(&config, now).err();

        assert_eq!(
            check(SeasonConfig::direct(Address::ZERO, now + 10)),
            Some(LedgerError::InvalidDestination)
        );
        assert!(matches!(
            check(SeasonConfig::direct(DEST, now)),
            Some(LedgerError::InvalidWindow(_))
        ));
        assert!(matches!(
            check(SeasonConfig::direct_windowed(DEST, now + 10, now + 10)),
            Some(LedgerError::InvalidWindow(_))
        ));
        let mut merkle_with_window = SeasonConfig::merkle(DEST, now + 10, [1u8; 32], 5);
        merkle_with_window.open_window_end = Some(now + 5);
        assert!(matches!(
            check(merkle_with_window),
            Some(LedgerError::InvalidWindow(_))
        ));
        assert_eq!(
            check(SeasonConfig::merkle(DEST, now + 10, [1u8; 32], 0)),
            Some(LedgerError::InvalidTotal)
        );
        assert_eq!(
            check(SeasonConfig::merkle(DEST, now + 10, ZERO_HASH, 5)),
            Some(LedgerError::InvalidRoot)
        );
    }

    #[test]
    fn test_window_end_must_fit_storage() {
        let registry = SeasonRegistry::new();
        assert!(matches!(
            registry.validate_open(&SeasonConfig::direct(DEST, u64::MAX), 0),
            Err(LedgerError::InvalidWindow(_))
        ));
        assert!(matches!(
            registry.validate_open(&SeasonConfig::direct(DEST, MAX_TIMESTAMP + 1), 0),
            Err(LedgerError::InvalidWindow(_))
        ));
        let season = registry
            .validate_open(&SeasonConfig::direct(DEST, MAX_TIMESTAMP), 0)
            .expect("largest storable end");
        assert_eq!(season.claim_window_end, MAX_TIMESTAMP);
    }

    #[test]
    fn test_merkle_season_starts_with_declared_total() {
        let registry = SeasonRegistry::new();
        let season = registry
            .validate_open(&SeasonConfig::merkle(DEST, 50, [3u8; 32], 60), 0)
            .expect("open");
        assert_eq!(season.total_rewards, 60);
        assert_eq!(season.mode.merkle_root(), Some(&[3u8; 32]));
    }

    #[test]
    fn test_sweep_validation() {
        let mut registry = SeasonRegistry::new();
        assert_eq!(
            registry.validate_sweep(0).err(),
            Some(LedgerError::NoActiveSeason)
        );

        let mut season = opened(&mut registry, SeasonConfig::direct(DEST, 100), 0);
        assert_eq!(
            registry.validate_sweep(100).err(),
            Some(LedgerError::ClaimWindowOpen(1))
        );
        assert_eq!(
            registry.validate_sweep(101).err(),
            Some(LedgerError::NothingToSweep(1))
        );

        season.total_rewards = 8;
        season.claimed_rewards = 5;
        registry.commit(season);
        let (staged, residue) = registry.validate_sweep(101).expect("sweep");
        assert_eq!(residue, 3);
        assert!(staged.unclaimed_funds_swept);
        // Nothing stored until commit.
        assert!(!registry.info(1).unclaimed_funds_swept);

        registry.commit(staged);
        assert_eq!(
            registry.validate_sweep(102).err(),
            Some(LedgerError::AlreadySwept(1))
        );
    }

    #[test]
    fn test_restore_rejects_gaps() {
        let seasons = vec![Season {
            index: 2,
            ..Season::default()
        }];
        assert!(matches!(
            SeasonRegistry::restore(seasons),
            Err(LedgerError::CorruptSnapshot(_))
        ));

        let seasons = vec![
            Season {
                index: 1,
                ..Season::default()
            },
            Season {
                index: 2,
                ..Season::default()
            },
        ];
        let registry = SeasonRegistry::restore(seasons).expect("restore");
        assert_eq!(registry.current_index(), 2);
    }
}
