//! # harvest-crypto
//!
//! Hashing primitives for reward allow-lists.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 hashing
//! - [`merkle`] — Sorted-pair binary Merkle trees: build, prove, verify

pub mod blake3;
pub mod merkle;

/// Error types for hashing and tree construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    /// A tree needs at least one leaf.
    #[error("cannot build a Merkle tree with no leaves")]
    EmptyTree,

    /// Leaf index outside the tree.
    #[error("leaf index {index} out of range ({count} leaves)")]
    LeafOutOfRange { index: usize, count: usize },

    /// The same recipient appears twice in an allow-list.
    #[error("duplicate allow-list entry for {0}")]
    DuplicateEntry(String),

    /// Allow-list amounts overflow the amount type.
    #[error("allow-list total overflows")]
    TotalOverflow,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
