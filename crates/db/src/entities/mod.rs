//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod fiscal_periods;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod sea_orm_active_enums;

pub mod prelude {
    //! Entity re-exports.

    pub use super::accounts::Entity as Accounts;
    pub use super::fiscal_periods::Entity as FiscalPeriods;
    pub use super::journal_entries::Entity as JournalEntries;
    pub use super::journal_entry_lines::Entity as JournalEntryLines;
}
