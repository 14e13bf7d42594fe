//! Journal repository: entry persistence and the DRAFT -> POSTED -> REVERSED
//! state machine.
//!
//! Every transition re-reads the entry and re-runs the `LedgerService` checks
//! on the connection that performs the write. The `*_in` functions take any
//! `ConnectionTrait` so a caller can chain several of them inside one
//! `DatabaseTransaction`; `reverse` does exactly that for create, post and
//! mark-original.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tally_core::ledger::{
    CreateJournalEntryData, EntryReference, EntryStatus, JournalEntry, JournalEntryFilter,
    JournalLine, LedgerError, LedgerService, ReversalService, SourceRule,
};
use tally_shared::types::{FiscalPeriodId, JournalEntryId, JournalLineId, Page, UserId};
use tracing::{info, warn};
use uuid::Uuid;

use super::account::AccountRepository;
use super::fiscal::FiscalRepository;
use crate::entities::{journal_entries, journal_entry_lines, sea_orm_active_enums};

/// Entry numbers tried before `create_in` gives up.
const ENTRY_NUMBER_ATTEMPTS: u32 = 3;

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a DRAFT entry with its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines do not validate, an account is unknown, or
    /// the database operation fails.
    pub async fn create(&self, data: CreateJournalEntryData) -> Result<JournalEntry, LedgerError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let entry = Self::create_in(&txn, data).await?;
        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(entry)
    }

    /// Creates a DRAFT entry on the given connection.
    ///
    /// The entry is stamped with the fiscal period covering its date, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines do not validate, an account is unknown, the
    /// source rule and reference were already recorded, or the database
    /// operation fails.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        data: CreateJournalEntryData,
    ) -> Result<JournalEntry, LedgerError> {
        LedgerService::validate_new_entry(&data)?;

        let requested = LedgerService::referenced_accounts(&data.lines);
        let existing = AccountRepository::existing_ids_in(conn, &requested)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        LedgerService::check_accounts_exist(&requested, &existing)?;

        let period = FiscalRepository::period_for_date_shared_in(conn, data.date)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let now = Utc::now();
        let entry_id = JournalEntryId::new();
        let entry_number = Self::free_entry_number_in(conn, data.date).await?;
        let reference = data.reference;
        let source_rule = data.source_rule;

        let model = journal_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            entry_number: Set(entry_number.clone()),
            date: Set(data.date),
            description: Set(data.description),
            reference_type: Set(reference.map(|r| r.kind.as_str().to_string())),
            reference_id: Set(reference.map(|r| r.id)),
            status: Set(sea_orm_active_enums::EntryStatus::Draft),
            fiscal_period_id: Set(period.as_ref().map(|p| p.id.into_inner())),
            posted_at: Set(None),
            reversed_entry_id: Set(None),
            created_by: Set(data.user_id.map(UserId::into_inner)),
            source_rule: Set(source_rule.map(|r| r.as_str().to_string())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(conn)
        .await
        .map_err(|e| map_insert_error(e, &entry_number, source_rule, reference))?;

        let mut lines = Vec::with_capacity(data.lines.len());
        for (idx, line) in data.lines.into_iter().enumerate() {
            let line_number = i32::try_from(idx + 1)
                .map_err(|_| LedgerError::Internal("too many journal lines".to_string()))?;
            let inserted = journal_entry_lines::ActiveModel {
                id: Set(JournalLineId::new().into_inner()),
                journal_entry_id: Set(entry_id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                line_number: Set(line_number),
                debit: Set(line.debit),
                credit: Set(line.credit),
                memo: Set(line.memo),
            }
            .insert(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
            lines.push(JournalLine::from(inserted));
        }

        let entry = entry_from_models(model, lines)?;
        info!(
            entry_id = %entry.id,
            entry_number = %entry.entry_number,
            date = %entry.date,
            fiscal_period_id = ?entry.fiscal_period_id,
            source_rule = ?entry.source_rule,
            "Journal entry created"
        );
        Ok(entry)
    }

    /// Posts a DRAFT entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is missing, not a draft, or its fiscal
    /// period is closed.
    pub async fn post(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let entry = Self::post_in(&txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(entry)
    }

    /// Posts a DRAFT entry on the given connection.
    ///
    /// The status write is conditional on the row still being DRAFT; losing
    /// that race surfaces as `ConcurrentModification`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is missing, not a draft, or its fiscal
    /// period is closed.
    pub async fn post_in<C: ConnectionTrait>(
        conn: &C,
        id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = Self::find_in(conn, id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;

        let period = match entry.fiscal_period_id {
            Some(period_id) => Self::load_period(conn, period_id).await?,
            None => None,
        };

        if let Err(err) = LedgerService::ensure_can_post(&entry, period.as_ref()) {
            warn!(
                entry_id = %id,
                entry_number = %entry.entry_number,
                status = %entry.status,
                error = %err,
                "Journal entry post rejected"
            );
            return Err(err);
        }

        let now = Utc::now();
        let result = journal_entries::Entity::update_many()
            .set(journal_entries::ActiveModel {
                status: Set(sea_orm_active_enums::EntryStatus::Posted),
                posted_at: Set(Some(now.into())),
                updated_at: Set(now.into()),
                ..Default::default()
            })
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Draft))
            .exec(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            warn!(entry_id = %id, entry_number = %entry.entry_number, "Journal entry changed before post");
            return Err(LedgerError::ConcurrentModification(entry.entry_number));
        }

        info!(entry_id = %id, entry_number = %entry.entry_number, "Journal entry posted");
        Ok(JournalEntry {
            status: EntryStatus::Posted,
            posted_at: Some(now),
            updated_at: now,
            ..entry
        })
    }

    /// Reverses a POSTED entry.
    ///
    /// Creates a mirrored entry dated today, posts it, and marks the original
    /// REVERSED, all in one transaction. Returns the original entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is missing or not posted, or the reversal
    /// cannot be posted (for example because today's period is closed).
    pub async fn reverse(
        &self,
        id: JournalEntryId,
        user_id: Option<UserId>,
    ) -> Result<JournalEntry, LedgerError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let original = Self::find_in(&txn, id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;
        if let Err(err) = LedgerService::ensure_can_reverse(&original) {
            warn!(
                entry_id = %id,
                entry_number = %original.entry_number,
                status = %original.status,
                "Journal entry reverse rejected"
            );
            return Err(err);
        }

        let data = ReversalService::build_reversal(&original, Utc::now().date_naive(), user_id);
        let reversal = Self::create_in(&txn, data).await?;
        let reversal = Self::post_in(&txn, reversal.id).await?;

        let now = Utc::now();
        let result = journal_entries::Entity::update_many()
            .set(journal_entries::ActiveModel {
                status: Set(sea_orm_active_enums::EntryStatus::Reversed),
                reversed_entry_id: Set(Some(reversal.id.into_inner())),
                updated_at: Set(now.into()),
                ..Default::default()
            })
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Posted))
            .exec(&txn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            warn!(entry_id = %id, entry_number = %original.entry_number, "Journal entry changed before reverse");
            return Err(LedgerError::ConcurrentModification(original.entry_number));
        }

        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        info!(
            entry_id = %id,
            entry_number = %original.entry_number,
            reversal_id = %reversal.id,
            reversal_number = %reversal.entry_number,
            "Journal entry reversed"
        );
        Ok(JournalEntry {
            status: EntryStatus::Reversed,
            reversed_entry_id: Some(reversal.id),
            updated_at: now,
            ..original
        })
    }

    /// Deletes a DRAFT entry and its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is missing or not a draft.
    pub async fn delete(&self, id: JournalEntryId) -> Result<(), LedgerError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let entry = Self::find_in(&txn, id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;
        if let Err(err) = LedgerService::ensure_can_delete(&entry) {
            warn!(
                entry_id = %id,
                entry_number = %entry.entry_number,
                status = %entry.status,
                "Journal entry delete rejected"
            );
            return Err(err);
        }

        journal_entry_lines::Entity::delete_many()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let result = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Draft))
            .exec(&txn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrentModification(entry.entry_number));
        }

        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        info!(entry_id = %id, entry_number = %entry.entry_number, "Journal entry deleted");
        Ok(())
    }

    /// Finds an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if no entry has this ID.
    pub async fn get(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        Self::find_in(&self.db, id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    /// Lists entries recorded for a business reference, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_by_reference(
        &self,
        reference: EntryReference,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let models = journal_entries::Entity::find()
            .filter(journal_entries::Column::ReferenceType.eq(reference.kind.as_str()))
            .filter(journal_entries::Column::ReferenceId.eq(reference.id))
            .order_by_desc(journal_entries::Column::Date)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Self::with_lines_in(&self.db, models).await
    }

    /// Lists entries matching the filter, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: JournalEntryFilter) -> Result<Page<JournalEntry>, LedgerError> {
        let mut query = journal_entries::Entity::find();

        if let Some(account_id) = filter.account_id {
            query = query.filter(
                journal_entries::Column::Id.in_subquery(
                    Query::select()
                        .column(journal_entry_lines::Column::JournalEntryId)
                        .from(journal_entry_lines::Entity)
                        .and_where(journal_entry_lines::Column::AccountId.eq(account_id.into_inner()))
                        .to_owned(),
                ),
            );
        }
        if let Some(from) = filter.from_date {
            query = query.filter(journal_entries::Column::Date.gte(from));
        }
        if let Some(to) = filter.to_date {
            query = query.filter(journal_entries::Column::Date.lte(to));
        }
        if let Some(reference_type) = filter.reference_type {
            query = query.filter(journal_entries::Column::ReferenceType.eq(reference_type.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::from(status)),
            );
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let models = query
            .order_by_desc(journal_entries::Column::Date)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .limit(filter.page.limit())
            .offset(filter.page.offset())
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let entries = Self::with_lines_in(&self.db, models).await?;
        Ok(Page::new(entries, total))
    }

    /// Finds an entry with its lines on the given connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored tag does not parse.
    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        let Some(model) = journal_entries::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(model.id))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        entry_from_models(model, lines.into_iter().map(Into::into).collect()).map(Some)
    }

    /// Finds the entry a rule recorded for an upstream reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored tag does not parse.
    pub async fn find_by_source_in<C: ConnectionTrait>(
        conn: &C,
        rule: SourceRule,
        reference_id: Uuid,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        let model = journal_entries::Entity::find()
            .filter(journal_entries::Column::ReferenceType.eq(rule.reference_type().as_str()))
            .filter(journal_entries::Column::ReferenceId.eq(reference_id))
            .filter(journal_entries::Column::SourceRule.eq(rule.as_str()))
            .one(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        match model {
            Some(model) => Self::find_in(conn, JournalEntryId::from_uuid(model.id)).await,
            None => Ok(None),
        }
    }

    /// Generates an entry number for `date` that no stored entry uses yet.
    ///
    /// A concurrent insert can still claim the same number between this check
    /// and the insert; that surfaces as `EntryNumberTaken`.
    async fn free_entry_number_in<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
    ) -> Result<String, LedgerError> {
        let mut attempt = 1;
        loop {
            let candidate = LedgerService::generate_entry_number(date);
            let taken = journal_entries::Entity::find()
                .filter(journal_entries::Column::EntryNumber.eq(candidate.as_str()))
                .count(conn)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;
            if taken == 0 {
                return Ok(candidate);
            }
            warn!(entry_number = %candidate, attempt, "Entry number collision");
            if attempt == ENTRY_NUMBER_ATTEMPTS {
                return Err(LedgerError::EntryNumberTaken(candidate));
            }
            attempt += 1;
        }
    }

    async fn load_period<C: ConnectionTrait>(
        conn: &C,
        id: FiscalPeriodId,
    ) -> Result<Option<tally_core::fiscal::FiscalPeriod>, LedgerError> {
        FiscalRepository::find_in(conn, id)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))
    }

    /// Loads the lines of several entries with one query, keeping entry order.
    async fn with_lines_in<C: ConnectionTrait>(
        conn: &C,
        models: Vec<journal_entries::Model>,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::JournalEntryId.is_in(models.iter().map(|m| m.id)))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(conn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut by_entry: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
        for line in lines {
            by_entry
                .entry(line.journal_entry_id)
                .or_default()
                .push(line.into());
        }

        models
            .into_iter()
            .map(|model| {
                let lines = by_entry.remove(&model.id).unwrap_or_default();
                entry_from_models(model, lines)
            })
            .collect()
    }
}

fn entry_from_models(
    model: journal_entries::Model,
    lines: Vec<JournalLine>,
) -> Result<JournalEntry, LedgerError> {
    let reference = EntryReference::from_parts(model.reference_type.as_deref(), model.reference_id)?;
    let source_rule = model
        .source_rule
        .as_deref()
        .map(str::parse::<SourceRule>)
        .transpose()?;

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        entry_number: model.entry_number,
        date: model.date,
        description: model.description,
        reference,
        status: model.status.into(),
        fiscal_period_id: model.fiscal_period_id.map(FiscalPeriodId::from_uuid),
        posted_at: model.posted_at.map(DateTime::<Utc>::from),
        reversed_entry_id: model.reversed_entry_id.map(JournalEntryId::from_uuid),
        created_by: model.created_by.map(UserId::from_uuid),
        source_rule,
        lines,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}

/// Unique indexes an entry insert can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniqueViolation {
    /// `(reference_type, reference_id, source_rule)`.
    SourceReference,
    /// `entry_number`.
    EntryNumber,
    Other,
}

/// Classifies a unique-violation message by index name (Postgres) or column
/// list (SQLite).
fn classify_unique_violation(message: &str) -> UniqueViolation {
    if message.contains("uidx-journal_entries-reference-source_rule")
        || message.contains("journal_entries.source_rule")
    {
        UniqueViolation::SourceReference
    } else if message.contains("uidx-journal_entries-entry_number")
        || message.contains("journal_entries.entry_number")
    {
        UniqueViolation::EntryNumber
    } else {
        UniqueViolation::Other
    }
}

fn map_insert_error(
    err: DbErr,
    entry_number: &str,
    source_rule: Option<SourceRule>,
    reference: Option<EntryReference>,
) -> LedgerError {
    let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() else {
        return LedgerError::Database(err.to_string());
    };
    match (classify_unique_violation(&message), source_rule, reference) {
        (UniqueViolation::SourceReference, Some(rule), Some(reference)) => {
            LedgerError::DuplicateSource {
                rule,
                reference_type: reference.kind,
                reference_id: reference.id,
            }
        }
        (UniqueViolation::EntryNumber, _, _) => {
            LedgerError::EntryNumberTaken(entry_number.to_string())
        }
        _ => LedgerError::Database(err.to_string()),
    }
}
