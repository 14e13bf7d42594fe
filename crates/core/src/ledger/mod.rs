//! Double-entry journal ledger.
//!
//! This module implements the journal rules:
//! - Domain types for entries, lines, references, and filters
//! - Line set validation (balance, one side per line)
//! - The DRAFT -> POSTED -> REVERSED state machine and entry numbering
//! - Mirrored reversal entries
//! - Account balance, running ledger, and trial balance arithmetic
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, AccountTotals, LedgerRow, PostedLine, TrialBalance, TrialBalanceRow};
pub use error::LedgerError;
pub use reversal::ReversalService;
pub use service::LedgerService;
pub use types::{
    CreateJournalEntryData, EntryReference, EntryStatus, EntryTotals, JournalEntry,
    JournalEntryFilter, JournalLine, JournalLineInput, ReferenceType, SourceRule,
};
pub use validation::{BALANCE_TOLERANCE, validate_lines};
