//! Read-side queries over posted journal lines.
//!
//! Lines count once their entry affects balances (see
//! `EntryStatus::affects_balances`). Balances and the trial balance are summed
//! and grouped by the database; the ledger view reads individual lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    Iterable, JoinType, QueryFilter, QuerySelect, RelationTrait, Select, SelectTwo,
};
use tally_core::ledger::{
    self, AccountBalance, AccountTotals, LedgerError, LedgerRow, PostedLine, TrialBalance,
};
use tally_shared::types::{AccountId, JournalEntryId};
use uuid::Uuid;

use crate::entities::{
    accounts, journal_entries, journal_entry_lines,
    sea_orm_active_enums::{AccountType, EntryStatus},
};

/// One trial balance row as aggregated by the database.
#[derive(Debug, FromQueryResult)]
struct AccountSumRow {
    account_id: Uuid,
    code: String,
    name: String,
    account_type: AccountType,
    debit_total: Option<Decimal>,
    credit_total: Option<Decimal>,
}

/// Balance, ledger and trial balance queries.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Signed balance of an account over posted lines dated within the range.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn account_balance(
        &self,
        account_id: AccountId,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<AccountBalance, LedgerError> {
        let account = self.load_account(account_id).await?;
        let (debit, credit) = Self::posted_totals_in(&self.db, account_id, from_date, to_date)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(AccountBalance::from_totals(
            account_id,
            account.account_type.into(),
            debit,
            credit,
        ))
    }

    /// Posted lines of an account in date order with a running balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn account_ledger(
        &self,
        account_id: AccountId,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let account = self.load_account(account_id).await?;

        let rows = posted_lines(from_date, to_date)
            .filter(journal_entry_lines::Column::AccountId.eq(account_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let lines = rows
            .into_iter()
            .filter_map(|(line, entry)| entry.map(|entry| posted_line(line, entry)))
            .collect();

        Ok(LedgerRow::build_ledger(account.account_type.into(), lines))
    }

    /// Aggregates posted lines by account up to `as_of` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(&self, as_of: Option<NaiveDate>) -> Result<TrialBalance, LedgerError> {
        let rows = posted_sums(None, as_of)
            .column(journal_entry_lines::Column::AccountId)
            .join(
                JoinType::InnerJoin,
                journal_entry_lines::Relation::Accounts.def(),
            )
            .column_as(accounts::Column::Code, "code")
            .column_as(accounts::Column::Name, "name")
            .column_as(accounts::Column::AccountType, "account_type")
            .group_by(journal_entry_lines::Column::AccountId)
            .group_by(accounts::Column::Code)
            .group_by(accounts::Column::Name)
            .group_by(accounts::Column::AccountType)
            .into_model::<AccountSumRow>()
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let totals = rows
            .into_iter()
            .map(|row| AccountTotals {
                account_id: AccountId::from_uuid(row.account_id),
                code: row.code,
                name: row.name,
                account_type: row.account_type.into(),
                debit_total: row.debit_total.unwrap_or_default(),
                credit_total: row.credit_total.unwrap_or_default(),
            })
            .collect();

        let trial_balance = TrialBalance::from_totals(as_of, totals);
        if !trial_balance.is_balanced {
            tracing::warn!(
                total_debit = %trial_balance.total_debit,
                total_credit = %trial_balance.total_credit,
                "Trial balance does not balance"
            );
        }
        Ok(trial_balance)
    }

    /// Debit and credit totals of an account over posted lines in range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn posted_totals_in<C: ConnectionTrait>(
        conn: &C,
        account_id: AccountId,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<(Decimal, Decimal), DbErr> {
        let sums: Option<(Option<Decimal>, Option<Decimal>)> = posted_sums(from_date, to_date)
            .filter(journal_entry_lines::Column::AccountId.eq(account_id.into_inner()))
            .into_tuple()
            .one(conn)
            .await?;

        Ok(sums.map_or((Decimal::ZERO, Decimal::ZERO), |(debit, credit)| {
            (debit.unwrap_or_default(), credit.unwrap_or_default())
        }))
    }

    async fn load_account(&self, account_id: AccountId) -> Result<accounts::Model, LedgerError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }
}

/// Stored statuses whose lines count towards balances.
fn balance_statuses() -> Vec<EntryStatus> {
    EntryStatus::iter()
        .filter(|status| ledger::EntryStatus::from(*status).affects_balances())
        .collect()
}

/// Lines joined with their entry, restricted to posted entries in range.
fn posted_lines(
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
) -> SelectTwo<journal_entry_lines::Entity, journal_entries::Entity> {
    let mut query = journal_entry_lines::Entity::find()
        .find_also_related(journal_entries::Entity)
        .filter(journal_entries::Column::Status.is_in(balance_statuses()));
    if let Some(from) = from_date {
        query = query.filter(journal_entries::Column::Date.gte(from));
    }
    if let Some(to) = to_date {
        query = query.filter(journal_entries::Column::Date.lte(to));
    }
    query
}

/// `SUM(debit)` and `SUM(credit)` over posted lines in range, selected as
/// `debit_total` and `credit_total`. Callers add grouping.
fn posted_sums(
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
) -> Select<journal_entry_lines::Entity> {
    let mut query = journal_entry_lines::Entity::find()
        .select_only()
        .column_as(line_sum(journal_entry_lines::Column::Debit), "debit_total")
        .column_as(line_sum(journal_entry_lines::Column::Credit), "credit_total")
        .join(
            JoinType::InnerJoin,
            journal_entry_lines::Relation::JournalEntries.def(),
        )
        .filter(journal_entries::Column::Status.is_in(balance_statuses()));
    if let Some(from) = from_date {
        query = query.filter(journal_entries::Column::Date.gte(from));
    }
    if let Some(to) = to_date {
        query = query.filter(journal_entries::Column::Date.lte(to));
    }
    query
}

fn line_sum(column: journal_entry_lines::Column) -> SimpleExpr {
    Expr::col((journal_entry_lines::Entity, column)).sum()
}

fn posted_line(line: journal_entry_lines::Model, entry: journal_entries::Model) -> PostedLine {
    PostedLine {
        entry_id: JournalEntryId::from_uuid(entry.id),
        entry_number: entry.entry_number,
        date: entry.date,
        description: entry.description,
        entry_created_at: entry.created_at.into(),
        line_number: line.line_number,
        debit: line.debit,
        credit: line.credit,
        memo: line.memo,
    }
}
