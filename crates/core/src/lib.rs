//! Core ledger rules for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `tally-db`
//! crate runs them inside database transactions.
//!
//! # Modules
//!
//! - `account` - Chart of accounts, sign convention, and the account-code registry
//! - `fiscal` - Fiscal period calendar rules
//! - `ledger` - Journal entry validation, state machine, reversal, and balances
//! - `auto_entry` - Derivation of journal entries from business events

pub mod account;
pub mod auto_entry;
pub mod error;
pub mod fiscal;
pub mod ledger;

pub use error::ErrorKind;
