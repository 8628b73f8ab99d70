//! # harvest-types
//!
//! Shared domain types used across the harvest workspace: seasons, reward
//! records, roles, ledger events and the persisted snapshot layout.

pub mod access;
pub mod address;
pub mod events;
pub mod reward;
pub mod season;
pub mod snapshot;

pub use address::{Address, ParseAddressError};

/// Common type aliases.
pub type Hash = [u8; 32];
pub type Amount = u128;
pub type Timestamp = u64;
pub type SeasonIndex = u64;

/// Index of the first season ever opened. Index 0 means "no season".
pub const FIRST_SEASON_INDEX: SeasonIndex = 1;

/// One day in seconds, the customary claim window granularity.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// All-zero hash, never a valid Merkle root.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Latest representable window end. Timestamps are stored as signed
/// 64-bit integers.
pub const MAX_TIMESTAMP: Timestamp = i64::MAX as Timestamp;
