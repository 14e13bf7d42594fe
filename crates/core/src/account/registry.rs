//! Registry of system accounts keyed by role.
//!
//! The auto-entry engine and the bootstrap never hard-code account codes; they
//! ask the registry which code plays a role. Codes can be overridden from
//! configuration, everything else about a default account is fixed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AccountError;
use super::types::AccountType;

/// The role a system account plays in automatic postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    /// Cash on hand.
    Cash,
    /// Bank balance.
    Bank,
    /// Amounts owed by customers.
    AccountsReceivable,
    /// Stock at cost.
    Inventory,
    /// Amounts owed to suppliers.
    AccountsPayable,
    /// Sales tax collected.
    SalesTaxPayable,
    /// Product sales.
    SalesRevenue,
    /// Shipping charged to customers.
    ShippingRevenue,
    /// Contra-revenue for refunds.
    SalesReturns,
    /// Cost of goods sold.
    CostOfGoodsSold,
    /// Shipping paid by the business.
    ShippingExpense,
    /// Fees withheld by couriers on COD remittances.
    CourierCharges,
}

impl AccountRole {
    /// All roles in chart order.
    pub const ALL: [Self; 12] = [
        Self::Cash,
        Self::Bank,
        Self::AccountsReceivable,
        Self::Inventory,
        Self::AccountsPayable,
        Self::SalesTaxPayable,
        Self::SalesRevenue,
        Self::ShippingRevenue,
        Self::SalesReturns,
        Self::CostOfGoodsSold,
        Self::ShippingExpense,
        Self::CourierCharges,
    ];

    /// Returns the role name (e.g. `"ACCOUNTS_RECEIVABLE"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Bank => "BANK",
            Self::AccountsReceivable => "ACCOUNTS_RECEIVABLE",
            Self::Inventory => "INVENTORY",
            Self::AccountsPayable => "ACCOUNTS_PAYABLE",
            Self::SalesTaxPayable => "SALES_TAX_PAYABLE",
            Self::SalesRevenue => "SALES_REVENUE",
            Self::ShippingRevenue => "SHIPPING_REVENUE",
            Self::SalesReturns => "SALES_RETURNS",
            Self::CostOfGoodsSold => "COST_OF_GOODS_SOLD",
            Self::ShippingExpense => "SHIPPING_EXPENSE",
            Self::CourierCharges => "COURIER_CHARGES",
        }
    }

    /// Built-in code, name, type and sub-type for this role.
    #[must_use]
    pub const fn defaults(self) -> (&'static str, &'static str, AccountType, &'static str) {
        match self {
            Self::Cash => ("1000", "Cash", AccountType::Asset, "cash"),
            Self::Bank => ("1010", "Bank", AccountType::Asset, "bank"),
            Self::AccountsReceivable => (
                "1200",
                "Accounts Receivable",
                AccountType::Asset,
                "accounts_receivable",
            ),
            Self::Inventory => ("1300", "Inventory", AccountType::Asset, "inventory"),
            Self::AccountsPayable => (
                "2000",
                "Accounts Payable",
                AccountType::Liability,
                "accounts_payable",
            ),
            Self::SalesTaxPayable => (
                "2100",
                "Sales Tax Payable",
                AccountType::Liability,
                "tax_payable",
            ),
            Self::SalesRevenue => (
                "4000",
                "Sales Revenue",
                AccountType::Revenue,
                "operating_revenue",
            ),
            Self::ShippingRevenue => (
                "4100",
                "Shipping Revenue",
                AccountType::Revenue,
                "other_revenue",
            ),
            Self::SalesReturns => (
                "4200",
                "Sales Returns",
                AccountType::Revenue,
                "contra_revenue",
            ),
            Self::CostOfGoodsSold => (
                "5000",
                "Cost of Goods Sold",
                AccountType::Expense,
                "cost_of_goods_sold",
            ),
            Self::ShippingExpense => (
                "5100",
                "Shipping Expense",
                AccountType::Expense,
                "operating_expense",
            ),
            Self::CourierCharges => (
                "5200",
                "Courier Charges",
                AccountType::Expense,
                "operating_expense",
            ),
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| AccountError::UnknownRole(s.to_string()))
    }
}

/// A system account as created by the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAccount {
    /// Role the account plays.
    pub role: AccountRole,
    /// Code from the registry.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sub-type.
    pub sub_type: String,
}

/// Role to code mapping used by automatic postings and the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCodeRegistry {
    codes: BTreeMap<AccountRole, String>,
}

impl Default for AccountCodeRegistry {
    fn default() -> Self {
        let codes = AccountRole::ALL
            .into_iter()
            .map(|role| (role, role.defaults().0.to_string()))
            .collect();
        Self { codes }
    }
}

impl AccountCodeRegistry {
    /// Builds a registry from the defaults plus `role -> code` overrides.
    ///
    /// Role names are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if a role is unknown, a code is blank, or two roles end up
    /// sharing a code.
    pub fn from_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, AccountError> {
        let mut registry = Self::default();
        for (role, code) in overrides {
            let role: AccountRole = role.parse()?;
            let code = code.trim();
            if code.is_empty() {
                return Err(AccountError::InvalidCode(code.to_string()));
            }
            registry.codes.insert(role, code.to_string());
        }

        let mut seen = BTreeSet::new();
        for code in registry.codes.values() {
            if !seen.insert(code.as_str()) {
                return Err(AccountError::DuplicateCode(code.clone()));
            }
        }

        Ok(registry)
    }

    /// Returns the code configured for a role.
    #[must_use]
    pub fn code(&self, role: AccountRole) -> &str {
        self.codes
            .get(&role)
            .map_or_else(|| role.defaults().0, String::as_str)
    }

    /// Returns the role a code is configured for, if any.
    #[must_use]
    pub fn role_for_code(&self, code: &str) -> Option<AccountRole> {
        self.codes
            .iter()
            .find(|(_, c)| c.as_str() == code)
            .map(|(role, _)| *role)
    }

    /// Returns every configured code in chart order.
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        AccountRole::ALL
            .into_iter()
            .map(|role| self.code(role).to_string())
            .collect()
    }

    /// Returns the full set of default accounts using the configured codes.
    #[must_use]
    pub fn default_accounts(&self) -> Vec<DefaultAccount> {
        AccountRole::ALL
            .into_iter()
            .map(|role| {
                let (_, name, account_type, sub_type) = role.defaults();
                DefaultAccount {
                    role,
                    code: self.code(role).to_string(),
                    name: name.to_string(),
                    account_type,
                    sub_type: sub_type.to_string(),
                }
            })
            .collect()
    }
}
