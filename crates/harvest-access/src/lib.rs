//! # harvest-access
//!
//! Role-based access control for the reward ledger.
//!
//! Two roles exist: `Admin` and `Writer`. `Admin` is the grantor and
//! revoker of every role, itself included. Any account may renounce a
//! role it holds, and only its own.
//!
//! ## Modules
//!
//! - [`registry`] — Enumerable role membership

pub mod registry;

pub use registry::AccessRegistry;

use harvest_types::access::Role;
use harvest_types::Address;

/// Error types for access control.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    /// The account lacks the role the operation requires.
    #[error("account {account} is missing role {role}")]
    Unauthorized { role: Role, account: Address },

    /// Renounce was called on behalf of another account.
    #[error("{sender} can only renounce roles for itself, not {account}")]
    RenounceForOther { sender: Address, account: Address },

    /// Roles cannot be held by the zero address.
    #[error("zero address cannot hold a role")]
    ZeroAccount,
}

/// Convenience result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;
