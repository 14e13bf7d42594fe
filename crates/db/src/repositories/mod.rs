//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Domain rules live in `tally_core`; repositories load state, run those rules
//! and write the result.

pub mod account;
pub mod auto_entry;
pub mod balance;
pub mod fiscal;
pub mod journal;

pub use account::AccountRepository;
pub use auto_entry::{AutoEntryService, ShipmentEntries};
pub use balance::BalanceRepository;
pub use fiscal::FiscalRepository;
pub use journal::JournalRepository;
