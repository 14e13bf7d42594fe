//! Account balance, running ledger, and trial balance calculations.
//!
//! All three views apply the per-type sign convention from
//! [`AccountType::sign_coefficient`]:
//! - Asset/Expense: balance = debit - credit (debit-normal)
//! - Liability/Equity/Revenue: balance = credit - debit (credit-normal)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId};

use super::validation::BALANCE_TOLERANCE;
use crate::account::AccountType;

/// Signed balance of one account over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// The account type the sign was taken from.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance under the account type's sign convention.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Builds a balance from raw totals.
    #[must_use]
    pub fn from_totals(
        account_id: AccountId,
        account_type: AccountType,
        debit_total: Decimal,
        credit_total: Decimal,
    ) -> Self {
        Self {
            account_id,
            account_type,
            debit_total,
            credit_total,
            balance: account_type.signed_balance(debit_total, credit_total),
        }
    }
}

/// A posted line as read for the ledger view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Owning entry number.
    pub entry_number: String,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Entry creation time, used to order entries sharing a date.
    pub entry_created_at: DateTime<Utc>,
    /// Line position within its entry.
    pub line_number: i32,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
}

/// One row of an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Owning entry number.
    pub entry_number: String,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
    /// Signed balance after this row, from the start of the result set.
    pub running_balance: Decimal,
}

impl LedgerRow {
    /// Orders posted lines chronologically and annotates each with its running balance.
    ///
    /// Ties on date are broken by entry creation time, then line number.
    #[must_use]
    pub fn build_ledger(account_type: AccountType, mut lines: Vec<PostedLine>) -> Vec<Self> {
        lines.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.entry_created_at.cmp(&b.entry_created_at))
                .then(a.line_number.cmp(&b.line_number))
        });

        let mut running = Decimal::ZERO;
        lines
            .into_iter()
            .map(|line| {
                running += account_type.signed_balance(line.debit, line.credit);
                Self {
                    entry_id: line.entry_id,
                    entry_number: line.entry_number,
                    date: line.date,
                    description: line.description,
                    debit: line.debit,
                    credit: line.credit,
                    memo: line.memo,
                    running_balance: running,
                }
            })
            .collect()
    }
}

/// Posted totals for one account, the input of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of posted debits.
    pub debit_total: Decimal,
    /// Sum of posted credits.
    pub credit_total: Decimal,
}

/// One row of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of posted debits.
    pub debit_total: Decimal,
    /// Sum of posted credits.
    pub credit_total: Decimal,
    /// `debit - credit`, direction left to the consumer.
    pub balance: Decimal,
    /// `balance` under the account type's sign convention.
    pub normal_balance: Decimal,
}

/// Aggregate of all posted lines by account as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Cutoff date (inclusive). `None` means all dates.
    pub as_of: Option<NaiveDate>,
    /// Rows ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Sum of all debits.
    pub total_debit: Decimal,
    /// Sum of all credits.
    pub total_credit: Decimal,
    /// `|total_debit - total_credit| < 0.01`.
    pub is_balanced: bool,
}

impl TrialBalance {
    /// Builds the trial balance from per-account totals.
    ///
    /// Accounts without posted activity are omitted.
    #[must_use]
    pub fn from_totals(as_of: Option<NaiveDate>, totals: Vec<AccountTotals>) -> Self {
        let mut rows: Vec<TrialBalanceRow> = totals
            .into_iter()
            .filter(|t| !(t.debit_total.is_zero() && t.credit_total.is_zero()))
            .map(|t| {
                let balance = t.debit_total - t.credit_total;
                TrialBalanceRow {
                    normal_balance: t.account_type.sign_coefficient() * balance,
                    account_id: t.account_id,
                    code: t.code,
                    name: t.name,
                    account_type: t.account_type,
                    debit_total: t.debit_total,
                    credit_total: t.credit_total,
                    balance,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.debit_total).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit_total).sum();

        Self {
            as_of,
            rows,
            total_debit,
            total_credit,
            is_balanced: (total_debit - total_credit).abs() < BALANCE_TOLERANCE,
        }
    }
}
