//! # harvest-ledger
//!
//! Season lifecycle, reward ledger and proof-based claims.
//!
//! An admin opens a season with a default destination and a claim window.
//! Rewards are either written row by row by writers (direct mode) or
//! committed to up front by a Merkle root (allow-list mode). Recipients
//! claim exactly once inside the claim window, and the unclaimed residue
//! is swept to the default destination before the next season may open.
//!
//! Every mutating call on [`SeasonLedger`] is a single atomic unit: all
//! preconditions are checked against staged copies, the value transfer is
//! attempted, and state is committed only if the transfer succeeded.
//!
//! ## Modules
//!
//! - [`registry`] — Season arena and lifecycle validation
//! - [`direct`] — Direct-mode reward rows
//! - [`merkle`] — Allow-list claim flags and proof verification
//! - [`strategy`] — The claim capability shared by both modes
//! - [`ledger`] — The atomic operation surface
//! - [`transfer`] — Value transfer collaborator
//! - [`clock`] — Wall-clock collaborator
//! - [`events`] — Audit journal and event broadcast
//! - [`config`] — TOML configuration

pub mod clock;
pub mod config;
pub mod direct;
pub mod events;
pub mod ledger;
pub mod merkle;
pub mod registry;
pub mod strategy;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, LedgerSettings, CONFIG_ENV_VAR};
pub use ledger::SeasonLedger;
pub use strategy::{ClaimRequest, ClaimStrategy, PreparedClaim};
pub use transfer::{Asset, InMemoryVault, TransferError, ValueTransfer};

use harvest_access::AccessError;
use harvest_types::{Address, Amount, SeasonIndex};

/// Failure categories callers can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Role or ownership check failed.
    Unauthorized,
    /// Bad arguments: zero address, inverted windows, zero total, oversized batch.
    InvalidConfiguration,
    /// Wrong lifecycle phase for the operation.
    SeasonState,
    /// No reward row for the identity in the current season.
    RecordNotFound,
    AlreadyClaimed,
    InvalidProof,
    /// The call would move more than is available.
    InsufficientFunds,
    /// One-shot action attempted twice.
    AlreadyActioned,
    /// The value transfer collaborator refused the payout.
    TransferFailed,
}

/// Error types for ledger operations.
///
/// Every error aborts the call with no state change.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Caller is neither the reward owner nor its destination.
    #[error("{caller} is neither the owner nor the destination of the reward")]
    NotAuthorized { caller: Address },

    #[error("destination must be a non-zero address")]
    InvalidDestination,

    #[error("reward owner must be a non-zero address")]
    InvalidOwner,

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("allow-list season must declare a non-zero total")]
    InvalidTotal,

    #[error("allow-list season must declare a non-zero Merkle root")]
    InvalidRoot,

    #[error("batch of {size} entries exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("no season has been opened")]
    NoActiveSeason,

    #[error("season {season_index} is a {actual} season, operation requires {expected}")]
    WrongClaimMode {
        season_index: SeasonIndex,
        expected: &'static str,
        actual: &'static str,
    },

    /// Assignment attempted after the assignment window.
    #[error("season {0} no longer accepts reward assignments")]
    SeasonClosed(SeasonIndex),

    #[error("season {0} is not yet claimable")]
    SeasonNotYetClaimable(SeasonIndex),

    #[error("claim window of season {0} is closed")]
    ClaimWindowClosed(SeasonIndex),

    /// Sweep attempted before the claim window ended.
    #[error("claim window of season {0} is still open")]
    ClaimWindowOpen(SeasonIndex),

    #[error("season {0} has not closed yet")]
    PreviousSeasonNotClosed(SeasonIndex),

    #[error("season {season_index} still holds {residue} unswept")]
    UnsweptResidue {
        season_index: SeasonIndex,
        residue: Amount,
    },

    #[error("no reward for {owner} in season {season_index}")]
    RewardNotFound {
        season_index: SeasonIndex,
        owner: Address,
    },

    #[error("{claimant} already claimed in season {season_index}")]
    AlreadyClaimed {
        season_index: SeasonIndex,
        claimant: Address,
    },

    /// Surfaced identically for malformed proofs and unlisted pairs.
    #[error("invalid Merkle proof")]
    InvalidProof,

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("season {0} has no unclaimed residue to sweep")]
    NothingToSweep(SeasonIndex),

    #[error("season {0} has already been swept")]
    AlreadySwept(SeasonIndex),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Access(_) | LedgerError::NotAuthorized { .. } => ErrorKind::Unauthorized,
            LedgerError::InvalidDestination
            | LedgerError::InvalidOwner
            | LedgerError::InvalidWindow(_)
            | LedgerError::InvalidTotal
            | LedgerError::InvalidRoot
            | LedgerError::BatchTooLarge { .. }
            | LedgerError::Overflow
            | LedgerError::CorruptSnapshot(_) => ErrorKind::InvalidConfiguration,
            LedgerError::NoActiveSeason
            | LedgerError::WrongClaimMode { .. }
            | LedgerError::SeasonClosed(_)
            | LedgerError::SeasonNotYetClaimable(_)
            | LedgerError::ClaimWindowClosed(_)
            | LedgerError::ClaimWindowOpen(_)
            | LedgerError::PreviousSeasonNotClosed(_)
            | LedgerError::UnsweptResidue { .. } => ErrorKind::SeasonState,
            LedgerError::RewardNotFound { .. } => ErrorKind::RecordNotFound,
            LedgerError::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            LedgerError::InvalidProof => ErrorKind::InvalidProof,
            LedgerError::InsufficientFunds { .. } | LedgerError::NothingToSweep(_) => {
                ErrorKind::InsufficientFunds
            }
            LedgerError::AlreadySwept(_) => ErrorKind::AlreadyActioned,
            LedgerError::Transfer(_) => ErrorKind::TransferFailed,
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
