//! Account repository for chart of accounts database operations.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tally_core::account::{
    Account, AccountCodeRegistry, AccountError, AccountFilter, AccountService, BootstrapReport,
    CreateAccountInput, UpdateAccountInput,
};
use tally_core::ledger::AccountBalance;
use tally_shared::types::AccountId;
use tracing::{info, warn};

use super::balance::BalanceRepository;
use crate::entities::{accounts, journal_entry_lines};

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Code or name is invalid
    /// - Code already exists
    /// - Parent account does not exist or has a different type
    pub async fn create(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        let parent = match input.parent_id {
            Some(parent_id) => Some(self.load_parent(parent_id).await?),
            None => None,
        };
        AccountService::validate_create(&input, parent.as_ref())?;

        if Self::find_model_by_code_in(&self.db, &input.code)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .is_some()
        {
            return Err(AccountError::DuplicateCode(input.code));
        }

        let now = chrono::Utc::now().into();
        let code = input.code.clone();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            sub_type: Set(input.sub_type),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            description: Set(input.description),
            is_system_account: Set(input.is_system_account),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account: Account = account
            .insert(&self.db)
            .await
            .map_err(|e| map_code_conflict(e, &code))?
            .into();

        info!(
            account_id = %account.id,
            code = %account.code,
            account_type = %account.account_type,
            "Account created"
        );
        Ok(account)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this ID.
    pub async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .map(Into::into)
            .ok_or(AccountError::NotFound(id))
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns `CodeNotFound` if no account has this code.
    pub async fn get_by_code(&self, code: &str) -> Result<Account, AccountError> {
        Self::find_model_by_code_in(&self.db, code)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .map(Into::into)
            .ok_or_else(|| AccountError::CodeNotFound(code.to_string()))
    }

    /// Lists accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: AccountFilter) -> Result<Vec<Account>, AccountError> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            query = query.filter(
                accounts::Column::AccountType
                    .eq(crate::entities::sea_orm_active_enums::AccountType::from(account_type)),
            );
        }
        if filter.active_only {
            query = query.filter(accounts::Column::Active.eq(true));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(accounts::Column::ParentId.eq(parent_id.into_inner()));
        }

        let accounts = query
            .all(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;
        Ok(accounts.into_iter().map(Into::into).collect())
    }

    /// Lists the direct children of an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn children(&self, id: AccountId) -> Result<Vec<Account>, AccountError> {
        self.get(id).await?;
        self.list(AccountFilter {
            parent_id: Some(id),
            ..AccountFilter::default()
        })
        .await
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Account or new parent not found
    /// - Code of a system account would change
    /// - New code already exists
    /// - New parent has another type or would create a cycle
    pub async fn update(
        &self,
        id: AccountId,
        patch: UpdateAccountInput,
    ) -> Result<Account, AccountError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .ok_or(AccountError::NotFound(id))?;
        let account: Account = model.clone().into();

        let (new_parent, ancestors) = match patch.parent_id {
            Some(Some(parent_id)) => {
                let parent = self.load_parent(parent_id).await?;
                let ancestors = self.ancestors_of(&parent).await?;
                (Some(parent), ancestors)
            }
            _ => (None, Vec::new()),
        };

        if let Err(err) =
            AccountService::validate_update(&account, &patch, new_parent.as_ref(), &ancestors)
        {
            warn!(account_id = %id, error = %err, "Account update rejected");
            return Err(err);
        }

        if let Some(code) = &patch.code
            && *code != account.code
        {
            let existing = accounts::Entity::find()
                .filter(accounts::Column::Code.eq(code))
                .filter(accounts::Column::Id.ne(id.into_inner()))
                .one(&self.db)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?;
            if existing.is_some() {
                return Err(AccountError::DuplicateCode(code.clone()));
            }
        }

        let new_code = patch.code.clone().unwrap_or_else(|| account.code.clone());
        let mut active: accounts::ActiveModel = model.into();
        if let Some(code) = patch.code {
            active.code = Set(code);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(sub_type) = patch.sub_type {
            active.sub_type = Set(sub_type);
        }
        if let Some(parent_id) = patch.parent_id {
            active.parent_id = Set(parent_id.map(AccountId::into_inner));
        }
        if let Some(is_active) = patch.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated: Account = active
            .update(&self.db)
            .await
            .map_err(|e| map_code_conflict(e, &new_code))?
            .into();

        info!(account_id = %updated.id, code = %updated.code, "Account updated");
        Ok(updated)
    }

    /// Hard-deletes an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is a system account, or still has journal
    /// lines or child accounts.
    pub async fn delete(&self, id: AccountId) -> Result<(), AccountError> {
        let account = self.get(id).await?;

        let line_count = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::AccountId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;
        let child_count = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        if let Err(err) = AccountService::validate_delete(&account, line_count, child_count) {
            warn!(account_id = %id, code = %account.code, error = %err, "Account delete rejected");
            return Err(err);
        }

        accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        info!(account_id = %id, code = %account.code, "Account deleted");
        Ok(())
    }

    /// Creates every default account of the registry that does not exist yet.
    ///
    /// Safe to run repeatedly: existing codes are reported as skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn initialize_default_accounts(
        &self,
        registry: &AccountCodeRegistry,
    ) -> Result<BootstrapReport, AccountError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        let mut report = BootstrapReport::default();
        for default in registry.default_accounts() {
            let exists = Self::find_model_by_code_in(&txn, &default.code)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?
                .is_some();
            if exists {
                report.skipped.push(default.code);
                continue;
            }

            let now = chrono::Utc::now().into();
            accounts::ActiveModel {
                id: Set(AccountId::new().into_inner()),
                code: Set(default.code.clone()),
                name: Set(default.name),
                account_type: Set(default.account_type.into()),
                sub_type: Set(Some(default.sub_type)),
                parent_id: Set(None),
                description: Set(None),
                is_system_account: Set(true),
                active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| map_code_conflict(e, &default.code))?;

            report.created.push(default.code);
        }

        txn.commit()
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Default accounts initialized"
        );
        Ok(report)
    }

    /// Computes the signed balance of an account over posted lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn get_account_balance(
        &self,
        id: AccountId,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<AccountBalance, AccountError> {
        let account = self.get(id).await?;
        let (debit, credit) = BalanceRepository::posted_totals_in(&self.db, id, from_date, to_date)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;
        Ok(AccountBalance::from_totals(
            id,
            account.account_type,
            debit,
            credit,
        ))
    }

    /// Maps the given codes to account IDs; unknown codes are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ids_by_codes_in<C: ConnectionTrait>(
        conn: &C,
        codes: &[String],
    ) -> Result<HashMap<String, AccountId>, DbErr> {
        let found = accounts::Entity::find()
            .filter(accounts::Column::Code.is_in(codes.iter().cloned()))
            .all(conn)
            .await?;
        Ok(found
            .into_iter()
            .map(|m| (m.code, AccountId::from_uuid(m.id)))
            .collect())
    }

    /// Returns which of the given IDs exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn existing_ids_in<C: ConnectionTrait>(
        conn: &C,
        ids: &[AccountId],
    ) -> Result<BTreeSet<AccountId>, DbErr> {
        let found = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().copied().map(AccountId::into_inner)))
            .all(conn)
            .await?;
        Ok(found
            .into_iter()
            .map(|m| AccountId::from_uuid(m.id))
            .collect())
    }

    async fn find_model_by_code_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
    ) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(conn)
            .await
    }

    async fn load_parent(&self, parent_id: AccountId) -> Result<Account, AccountError> {
        accounts::Entity::find_by_id(parent_id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .map(Into::into)
            .ok_or(AccountError::ParentNotFound(parent_id))
    }

    /// Walks from `account` to the root, returning the IDs on the way up.
    async fn ancestors_of(&self, account: &Account) -> Result<Vec<AccountId>, AccountError> {
        let mut ancestors = Vec::new();
        let mut next = account.parent_id;
        while let Some(id) = next {
            if id == account.id || ancestors.contains(&id) {
                break;
            }
            ancestors.push(id);
            next = accounts::Entity::find_by_id(id.into_inner())
                .one(&self.db)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?
                .and_then(|m| m.parent_id.map(AccountId::from_uuid));
        }
        Ok(ancestors)
    }
}

fn map_code_conflict(err: DbErr, code: &str) -> AccountError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AccountError::DuplicateCode(code.to_string()),
        _ => AccountError::Database(err.to_string()),
    }
}
