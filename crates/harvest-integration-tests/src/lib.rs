//! Integration test crate for the harvest ledger.
//!
//! This crate has no library code. It only contains integration tests
//! that drive full season lifecycles across the workspace crates:
//! ledger, Merkle proofs, SQLite persistence and concurrent callers.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p harvest-integration-tests
//! ```
