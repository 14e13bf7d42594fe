//! Auto-entry rule engine.
//!
//! Turns business events emitted by other subsystems (shipments, payments,
//! COD remittances, refunds, purchases, bill settlements) into balanced journal
//! entry data. Account ids are resolved by role through the
//! [`AccountCodeRegistry`](crate::account::AccountCodeRegistry); the persistence
//! layer then creates and posts the entry.

pub mod error;
pub mod events;
pub mod rules;

pub use error::AutoEntryError;
pub use events::{
    BillPaymentEvent, CodRemittanceEvent, CogsEvent, OrderShippedEvent, PaymentMethod,
    PaymentReceivedEvent, PurchaseEvent, RefundEvent,
};
pub use rules::{AutoEntryRules, ResolvedAccounts};
