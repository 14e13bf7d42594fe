//! Account directory rules.
//!
//! The repository loads whatever state a rule needs (parent, counts) and
//! passes it in; the rules themselves never touch storage.

use tally_shared::types::AccountId;

use super::error::AccountError;
use super::types::{Account, AccountType, CreateAccountInput, UpdateAccountInput};

/// Maximum length of an account code.
pub const MAX_CODE_LEN: usize = 32;

/// Stateless service for account validation.
pub struct AccountService;

impl AccountService {
    /// Validates an account code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCode` if the code is blank, too long, or contains whitespace.
    pub fn validate_code(code: &str) -> Result<(), AccountError> {
        if code.is_empty() || code.len() > MAX_CODE_LEN || code.chars().any(char::is_whitespace) {
            return Err(AccountError::InvalidCode(code.to_string()));
        }
        Ok(())
    }

    /// Validates a create request against its (already loaded) parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the code or name is invalid, or the parent type differs.
    pub fn validate_create(
        input: &CreateAccountInput,
        parent: Option<&Account>,
    ) -> Result<(), AccountError> {
        Self::validate_code(&input.code)?;
        if input.name.trim().is_empty() {
            return Err(AccountError::EmptyName);
        }
        if let Some(parent) = parent {
            Self::validate_parent_type(parent.account_type, input.account_type)?;
        }
        Ok(())
    }

    /// Validates a patch against the current account.
    ///
    /// `new_parent` is the loaded parent when the patch sets one, and
    /// `parent_ancestors` are the ids on the path from that parent to the root.
    ///
    /// # Errors
    ///
    /// Returns an error if a system code would change, a field is invalid, or the
    /// new parent has another type or would create a cycle.
    pub fn validate_update(
        account: &Account,
        patch: &UpdateAccountInput,
        new_parent: Option<&Account>,
        parent_ancestors: &[AccountId],
    ) -> Result<(), AccountError> {
        if let Some(code) = &patch.code
            && code != &account.code
        {
            if account.is_system_account {
                return Err(AccountError::SystemCodeImmutable(account.code.clone()));
            }
            Self::validate_code(code)?;
        }

        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(AccountError::EmptyName);
        }

        if let Some(parent) = new_parent {
            if parent.id == account.id || parent_ancestors.contains(&account.id) {
                return Err(AccountError::ParentCycle(account.id));
            }
            Self::validate_parent_type(parent.account_type, account.account_type)?;
        }

        Ok(())
    }

    /// Validates that an account may be hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the account is a system account or is still referenced.
    pub fn validate_delete(
        account: &Account,
        line_count: u64,
        child_count: u64,
    ) -> Result<(), AccountError> {
        if account.is_system_account {
            return Err(AccountError::SystemAccountDelete(account.code.clone()));
        }
        if line_count > 0 {
            return Err(AccountError::HasJournalLines(account.code.clone()));
        }
        if child_count > 0 {
            return Err(AccountError::HasChildren(account.code.clone()));
        }
        Ok(())
    }

    fn validate_parent_type(parent: AccountType, child: AccountType) -> Result<(), AccountError> {
        if parent != child {
            return Err(AccountError::ParentTypeMismatch { parent, child });
        }
        Ok(())
    }
}
