//! Value transfer collaborator.
//!
//! The ledger decides amounts and destinations; an implementation of
//! [`ValueTransfer`] actually moves the asset. A failed transfer must not
//! move anything.

use std::collections::{BTreeMap, BTreeSet};

use harvest_types::{Address, Amount};

/// Error types for value transfers.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("vault holds {available}, cannot move {requested}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("destination {0} rejected the transfer")]
    Rejected(Address),

    #[error("cannot transfer to the zero address")]
    ZeroDestination,
}

/// Moves funds out of the pool backing the ledger.
pub trait ValueTransfer {
    /// Move `amount` to `to`. All-or-nothing.
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Funds currently held by the pool.
    fn balance(&self) -> Amount;
}

/// The asset a vault holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asset {
    /// The host's native currency.
    Native,
    /// A fungible token identified by its contract address.
    Token { contract: Address },
}

/// In-process pool that records every payout.
#[derive(Clone, Debug)]
pub struct InMemoryVault {
    asset: Asset,
    balance: Amount,
    paid: BTreeMap<Address, Amount>,
    rejected: BTreeSet<Address>,
}

impl InMemoryVault {
    pub fn new(asset: Asset, balance: Amount) -> Self {
        Self {
            asset,
            balance,
            paid: BTreeMap::new(),
            rejected: BTreeSet::new(),
        }
    }

    /// Native-currency vault with an initial float.
    pub fn native(balance: Amount) -> Self {
        Self::new(Asset::Native, balance)
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    /// Add float to the pool.
    pub fn deposit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Total paid to `destination` so far.
    pub fn paid_to(&self, destination: &Address) -> Amount {
        self.paid.get(destination).copied().unwrap_or(0)
    }

    /// Total paid out across all destinations.
    pub fn total_paid(&self) -> Amount {
        self.paid.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    /// Make every future transfer to `destination` fail.
    pub fn reject(&mut self, destination: Address) {
        self.rejected.insert(destination);
    }

    /// Undo [`reject`](Self::reject).
    pub fn accept(&mut self, destination: &Address) {
        self.rejected.remove(destination);
    }
}

impl ValueTransfer for InMemoryVault {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        if to.is_zero() {
            return Err(TransferError::ZeroDestination);
        }
        if self.rejected.contains(to) {
            return Err(TransferError::Rejected(*to));
        }
        let remaining =
            self.balance
                .checked_sub(amount)
                .ok_or(TransferError::InsufficientBalance {
                    requested: amount,
                    available: self.balance,
                })?;

        self.balance = remaining;
        let entry = self.paid.entry(*to).or_insert(0);
        *entry = entry.saturating_add(amount);

        tracing::trace!(asset = ?self.asset, %to, amount, "vault transfer");
        Ok(())
    }

    fn balance(&self) -> Amount {
        self.balance
    }
}
