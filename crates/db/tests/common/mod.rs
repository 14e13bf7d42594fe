//! Shared fixtures for the SQLite integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tally_core::account::{AccountCodeRegistry, AccountRole};
use tally_core::ledger::{CreateJournalEntryData, JournalLineInput};
use tally_db::AccountRepository;
use tally_db::migration::{Migrator, MigratorTrait};
use tally_shared::types::AccountId;

/// Fresh in-memory database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = tally_db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to sqlite");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Database with the default chart of accounts.
pub async fn setup_with_accounts() -> DatabaseConnection {
    let db = setup_db().await;
    AccountRepository::new(db.clone())
        .initialize_default_accounts(&AccountCodeRegistry::default())
        .await
        .expect("Failed to bootstrap accounts");
    db
}

/// ID of the default account for a role.
pub async fn account_id(db: &DatabaseConnection, role: AccountRole) -> AccountId {
    let registry = AccountCodeRegistry::default();
    AccountRepository::new(db.clone())
        .get_by_code(registry.code(role))
        .await
        .expect("Default account missing")
        .id
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Two-line entry: debit one account, credit another.
pub fn simple_entry(
    on: NaiveDate,
    debit: AccountId,
    credit: AccountId,
    amount: Decimal,
) -> CreateJournalEntryData {
    CreateJournalEntryData::new(
        on,
        "Test entry",
        vec![
            JournalLineInput::debit(debit, amount),
            JournalLineInput::credit(credit, amount),
        ],
    )
}
