//! Chart of accounts.
//!
//! This module owns the account model and its rules:
//! - Account types and the per-type sign convention
//! - Create/update/delete validation for the account tree
//! - The registry of system accounts keyed by role

pub mod error;
pub mod registry;
pub mod rules;
pub mod types;

pub use error::AccountError;
pub use registry::{AccountCodeRegistry, AccountRole, DefaultAccount};
pub use rules::AccountService;
pub use types::{
    Account, AccountFilter, AccountType, BootstrapReport, CreateAccountInput, NormalSide,
    UpdateAccountInput,
};
