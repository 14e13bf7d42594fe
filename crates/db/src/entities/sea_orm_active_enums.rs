//! String-backed enums stored in ledger columns.
//!
//! Each enum mirrors a `tally_core` type and converts to and from it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::account;
use tally_core::fiscal;
use tally_core::ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FiscalPeriodStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

impl From<account::AccountType> for AccountType {
    fn from(value: account::AccountType) -> Self {
        match value {
            account::AccountType::Asset => Self::Asset,
            account::AccountType::Liability => Self::Liability,
            account::AccountType::Equity => Self::Equity,
            account::AccountType::Revenue => Self::Revenue,
            account::AccountType::Expense => Self::Expense,
        }
    }
}

impl From<AccountType> for account::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<fiscal::FiscalPeriodStatus> for FiscalPeriodStatus {
    fn from(value: fiscal::FiscalPeriodStatus) -> Self {
        match value {
            fiscal::FiscalPeriodStatus::Open => Self::Open,
            fiscal::FiscalPeriodStatus::Closed => Self::Closed,
        }
    }
}

impl From<FiscalPeriodStatus> for fiscal::FiscalPeriodStatus {
    fn from(value: FiscalPeriodStatus) -> Self {
        match value {
            FiscalPeriodStatus::Open => Self::Open,
            FiscalPeriodStatus::Closed => Self::Closed,
        }
    }
}

impl From<ledger::EntryStatus> for EntryStatus {
    fn from(value: ledger::EntryStatus) -> Self {
        match value {
            ledger::EntryStatus::Draft => Self::Draft,
            ledger::EntryStatus::Posted => Self::Posted,
            ledger::EntryStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<EntryStatus> for ledger::EntryStatus {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Draft => Self::Draft,
            EntryStatus::Posted => Self::Posted,
            EntryStatus::Reversed => Self::Reversed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_account_type_conversion_covers_all() {
        for core in account::AccountType::ALL {
            let db = AccountType::from(core);
            assert_eq!(account::AccountType::from(db), core);
            assert_eq!(db.to_value(), core.as_str());
        }
    }

    #[test]
    fn test_entry_status_values_match_core() {
        for db in EntryStatus::iter() {
            let core = ledger::EntryStatus::from(db);
            assert_eq!(db.to_value(), core.as_str());
            assert_eq!(EntryStatus::from(core), db);
        }
    }

    #[test]
    fn test_fiscal_status_values_match_core() {
        for db in FiscalPeriodStatus::iter() {
            assert_eq!(db.to_value(), fiscal::FiscalPeriodStatus::from(db).as_str());
        }
    }
}
