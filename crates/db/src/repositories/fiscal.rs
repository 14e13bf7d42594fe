//! Fiscal period repository.
//!
//! Overlap checks read every period and insert inside one serializable
//! transaction, so two concurrent creates cannot both pass the check.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tally_core::fiscal::{
    CreateFiscalPeriodInput, FiscalCalendar, FiscalError, FiscalPeriod, UpdateFiscalPeriodInput,
};
use tally_shared::types::FiscalPeriodId;
use tracing::{info, warn};

use crate::entities::{
    fiscal_periods, journal_entries,
    sea_orm_active_enums::{EntryStatus, FiscalPeriodStatus},
};

/// Fiscal period repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an OPEN fiscal period.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, `end_date <= start_date`, or the
    /// range overlaps an existing period.
    pub async fn create(&self, input: CreateFiscalPeriodInput) -> Result<FiscalPeriod, FiscalError> {
        let txn = self.begin_serializable().await?;

        let existing = Self::all_in(&txn).await?;
        if let Err(err) =
            FiscalCalendar::validate_new_period(&input.name, input.start_date, input.end_date, &existing)
        {
            warn!(name = %input.name, error = %err, "Fiscal period create rejected");
            return Err(err);
        }

        let now = chrono::Utc::now().into();
        let period: FiscalPeriod = fiscal_periods::ActiveModel {
            id: Set(FiscalPeriodId::new().into_inner()),
            name: Set(input.name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status: Set(FiscalPeriodStatus::Open),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| FiscalError::Database(e.to_string()))?
        .into();

        txn.commit()
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?;

        info!(
            period_id = %period.id,
            name = %period.name,
            start_date = %period.start_date,
            end_date = %period.end_date,
            "Fiscal period created"
        );
        Ok(period)
    }

    /// Finds a fiscal period by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no period has this ID.
    pub async fn get(&self, id: FiscalPeriodId) -> Result<FiscalPeriod, FiscalError> {
        Self::find_in(&self.db, id)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?
            .ok_or(FiscalError::NotFound(id))
    }

    /// Lists all periods ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<FiscalPeriod>, FiscalError> {
        Self::all_in(&self.db).await
    }

    /// Updates name and dates of an OPEN period.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is closed or the new range is invalid or
    /// overlaps another period.
    pub async fn update(
        &self,
        id: FiscalPeriodId,
        patch: UpdateFiscalPeriodInput,
    ) -> Result<FiscalPeriod, FiscalError> {
        let txn = self.begin_serializable().await?;

        let model = Self::find_model_in(&txn, id).await?;
        let current: FiscalPeriod = model.clone().into();
        let existing = Self::all_in(&txn).await?;

        let (start_date, end_date) = match FiscalCalendar::validate_update(&current, &patch, &existing)
        {
            Ok(range) => range,
            Err(err) => {
                warn!(period_id = %id, error = %err, "Fiscal period update rejected");
                return Err(err);
            }
        };

        let mut active: fiscal_periods::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        active.start_date = Set(start_date);
        active.end_date = Set(end_date);
        active.updated_at = Set(chrono::Utc::now().into());

        let updated: FiscalPeriod = active
            .update(&txn)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?
            .into();

        txn.commit()
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?;

        info!(period_id = %updated.id, name = %updated.name, "Fiscal period updated");
        Ok(updated)
    }

    /// Closes a period that holds no DRAFT entries.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the period is already closed or has drafts.
    pub async fn close(&self, id: FiscalPeriodId) -> Result<FiscalPeriod, FiscalError> {
        let txn = self.begin_serializable().await?;

        let model = Self::find_model_in(&txn, id).await?;
        let current: FiscalPeriod = model.clone().into();

        let draft_count = journal_entries::Entity::find()
            .filter(journal_entries::Column::FiscalPeriodId.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(EntryStatus::Draft))
            .count(&txn)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?;

        if let Err(err) = FiscalCalendar::validate_close(&current, draft_count) {
            warn!(period_id = %id, draft_count, error = %err, "Fiscal period close rejected");
            return Err(err);
        }

        let now = chrono::Utc::now().into();
        let mut active: fiscal_periods::ActiveModel = model.into();
        active.status = Set(FiscalPeriodStatus::Closed);
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);

        let closed: FiscalPeriod = active
            .update(&txn)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?
            .into();

        txn.commit()
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?;

        info!(period_id = %closed.id, name = %closed.name, "Fiscal period closed");
        Ok(closed)
    }

    /// Reopens a CLOSED period.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyOpen` if the period is open.
    pub async fn reopen(&self, id: FiscalPeriodId) -> Result<FiscalPeriod, FiscalError> {
        let model = Self::find_model_in(&self.db, id).await?;
        let current: FiscalPeriod = model.clone().into();

        if let Err(err) = FiscalCalendar::validate_reopen(&current) {
            warn!(period_id = %id, error = %err, "Fiscal period reopen rejected");
            return Err(err);
        }

        let mut active: fiscal_periods::ActiveModel = model.into();
        active.status = Set(FiscalPeriodStatus::Open);
        active.closed_at = Set(None);
        active.updated_at = Set(chrono::Utc::now().into());

        let reopened: FiscalPeriod = active
            .update(&self.db)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?
            .into();

        info!(period_id = %reopened.id, name = %reopened.name, "Fiscal period reopened");
        Ok(reopened)
    }

    /// Finds the period whose range covers `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn period_for_date(&self, date: NaiveDate) -> Result<Option<FiscalPeriod>, FiscalError> {
        Self::period_for_date_in(&self.db, date)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))
    }

    /// Finds the OPEN period covering today's UTC date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_period(&self) -> Result<Option<FiscalPeriod>, FiscalError> {
        let today = chrono::Utc::now().date_naive();
        Ok(self
            .period_for_date(today)
            .await?
            .filter(FiscalPeriod::is_open))
    }

    /// Finds the period covering `date` on the given connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn period_for_date_in<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
    ) -> Result<Option<FiscalPeriod>, DbErr> {
        let period = covering(date).one(conn).await?;
        Ok(period.map(Into::into))
    }

    /// Finds the period covering `date` and holds a shared row lock on it
    /// until the surrounding transaction ends.
    ///
    /// `close` takes the row exclusively, so a close and an entry being
    /// stamped with the same period cannot interleave. SQLite has no row
    /// locks; its writers are already serialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn period_for_date_shared_in<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
    ) -> Result<Option<FiscalPeriod>, DbErr> {
        let period = covering(date).lock_shared().one(conn).await?;
        Ok(period.map(Into::into))
    }

    /// Finds a period by ID on the given connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        id: FiscalPeriodId,
    ) -> Result<Option<FiscalPeriod>, DbErr> {
        let period = fiscal_periods::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?;
        Ok(period.map(Into::into))
    }

    async fn find_model_in<C: ConnectionTrait>(
        conn: &C,
        id: FiscalPeriodId,
    ) -> Result<fiscal_periods::Model, FiscalError> {
        fiscal_periods::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?
            .ok_or(FiscalError::NotFound(id))
    }

    async fn all_in<C: ConnectionTrait>(conn: &C) -> Result<Vec<FiscalPeriod>, FiscalError> {
        let periods = fiscal_periods::Entity::find()
            .order_by_asc(fiscal_periods::Column::StartDate)
            .all(conn)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))?;
        Ok(periods.into_iter().map(Into::into).collect())
    }

    async fn begin_serializable(&self) -> Result<DatabaseTransaction, FiscalError> {
        self.db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(|e| FiscalError::Database(e.to_string()))
    }
}

/// Periods whose inclusive range contains `date`.
fn covering(date: NaiveDate) -> Select<fiscal_periods::Entity> {
    fiscal_periods::Entity::find()
        .filter(fiscal_periods::Column::StartDate.lte(date))
        .filter(fiscal_periods::Column::EndDate.gte(date))
}
