//! Common types used across the ledger.

pub mod id;
pub mod pagination;

pub use id::*;
pub use pagination::{Page, PageRequest};
