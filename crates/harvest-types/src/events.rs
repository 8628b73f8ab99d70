//! Ledger events consumed by auditors.
//!
//! Events are emitted only after the state change they describe has been
//! committed. A failed call emits nothing.

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::{Address, Amount, SeasonIndex, Timestamp};

/// Envelope for all ledger events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence number, starting at 1.
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub kind: EventKind,
}

/// All event types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event_type")]
pub enum EventKind {
    SeasonOpened {
        season_index: SeasonIndex,
        mode: String,
        claim_window_end: Timestamp,
        total_rewards: Amount,
    },
    RewardAssigned {
        season_index: SeasonIndex,
        owner: Address,
        destination: Address,
        amount: Amount,
        /// Amount of the row this assignment replaced, if any.
        replaced: Option<Amount>,
    },
    RewardClaimed {
        season_index: SeasonIndex,
        claimant: Address,
        destination: Address,
        amount: Amount,
    },
    UnclaimedSwept {
        season_index: SeasonIndex,
        destination: Address,
        amount: Amount,
    },
    ExcessWithdrawn {
        to: Address,
        amount: Amount,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SeasonOpened { .. } => "SeasonOpened",
            EventKind::RewardAssigned { .. } => "RewardAssigned",
            EventKind::RewardClaimed { .. } => "RewardClaimed",
            EventKind::UnclaimedSwept { .. } => "UnclaimedSwept",
            EventKind::ExcessWithdrawn { .. } => "ExcessWithdrawn",
            EventKind::RoleGranted { .. } => "RoleGranted",
            EventKind::RoleRevoked { .. } => "RoleRevoked",
        }
    }
}
