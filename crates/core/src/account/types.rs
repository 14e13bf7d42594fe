//! Account domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::error::AccountError;

/// Top-level classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

/// The side that increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the stored representation (e.g. `"ASSET"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }

    /// Returns the side that increases this account type.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Expense => NormalSide::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalSide::Credit,
        }
    }

    /// Sign coefficient applied to `debit - credit`.
    ///
    /// `+1` for debit-normal types, `-1` for credit-normal types.
    #[must_use]
    pub const fn sign_coefficient(self) -> Decimal {
        match self.normal_side() {
            NormalSide::Debit => Decimal::ONE,
            NormalSide::Credit => Decimal::NEGATIVE_ONE,
        }
    }

    /// Signed balance of the given totals under this type's convention.
    ///
    /// Asset/Expense: `debit - credit`. Liability/Equity/Revenue: `credit - debit`.
    #[must_use]
    pub fn signed_balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        self.sign_coefficient() * (debit - credit)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "REVENUE" => Ok(Self::Revenue),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(AccountError::InvalidAccountType(s.to_string())),
        }
    }
}

/// A node in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Globally unique account code (e.g. "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type. Children share their parent's type.
    pub account_type: AccountType,
    /// Finer, informational classification (e.g. "accounts_receivable").
    pub sub_type: Option<String>,
    /// Parent account in the tree.
    pub parent_id: Option<AccountId>,
    /// Free-form description.
    pub description: Option<String>,
    /// System accounts keep their code forever and cannot be deleted.
    pub is_system_account: bool,
    /// Inactive accounts are hidden from `active_only` listings.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountInput {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Optional sub-type.
    #[serde(default)]
    pub sub_type: Option<String>,
    /// Optional parent account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether this is a system account.
    #[serde(default)]
    pub is_system_account: bool,
}

impl CreateAccountInput {
    /// Creates an input with only the required fields set.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            sub_type: None,
            parent_id: None,
            description: None,
            is_system_account: false,
        }
    }
}

/// Partial update of an account.
///
/// `None` leaves a field untouched. For nullable fields the inner `None` clears it.
/// The account type is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAccountInput {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New sub-type.
    pub sub_type: Option<Option<String>>,
    /// New parent.
    pub parent_id: Option<Option<AccountId>>,
    /// New active flag.
    pub active: Option<bool>,
}

/// Filter for listing accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active accounts.
    #[serde(default)]
    pub active_only: bool,
    /// Only direct children of this account.
    pub parent_id: Option<AccountId>,
}

/// Outcome of bootstrapping the default accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Codes created by this run.
    pub created: Vec<String>,
    /// Codes that already existed.
    pub skipped: Vec<String>,
}
