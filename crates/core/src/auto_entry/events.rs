//! Business events consumed by the auto-entry engine.
//!
//! Events carry the upstream identifier and the amounts; the upstream entity
//! itself is owned by another subsystem and never re-read here.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::UserId;
use uuid::Uuid;

use super::error::AutoEntryError;
use crate::account::AccountRole;

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash in hand.
    Cash,
    /// Cash on delivery.
    Cod,
    /// Bank transfer.
    BankTransfer,
    /// Card payment.
    Card,
    /// Online gateway.
    Online,
}

impl PaymentMethod {
    /// Asset account the money lands in (or leaves from).
    #[must_use]
    pub const fn settlement_role(self) -> AccountRole {
        match self {
            Self::Cash | Self::Cod => AccountRole::Cash,
            Self::BankTransfer | Self::Card | Self::Online => AccountRole::Bank,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Cod => "COD",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Card => "CARD",
            Self::Online => "ONLINE",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = AutoEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "COD" => Ok(Self::Cod),
            "BANK_TRANSFER" | "BANK" => Ok(Self::BankTransfer),
            "CARD" => Ok(Self::Card),
            "ONLINE" => Ok(Self::Online),
            _ => Err(AutoEntryError::InvalidEvent(format!(
                "unknown payment method: {s}"
            ))),
        }
    }
}

/// An order left the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShippedEvent {
    /// Upstream order id.
    pub order_id: Uuid,
    /// Human-readable order number for descriptions.
    pub order_number: String,
    /// Shipment date.
    pub date: NaiveDate,
    /// Order total including shipping.
    pub total: Decimal,
    /// Shipping charged to the customer (part of `total`).
    #[serde(default)]
    pub shipping_charges: Decimal,
    /// Inventory cost of the shipped goods. When set, a COGS entry follows.
    #[serde(default)]
    pub cost_amount: Option<Decimal>,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl OrderShippedEvent {
    /// The COGS event implied by `cost_amount`, if any.
    #[must_use]
    pub fn cogs_event(&self) -> Option<CogsEvent> {
        self.cost_amount.map(|cost| CogsEvent {
            order_id: self.order_id,
            order_number: self.order_number.clone(),
            date: self.date,
            cost,
            user_id: self.user_id,
        })
    }
}

/// Cost of goods sold for a shipped order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogsEvent {
    /// Upstream order id.
    pub order_id: Uuid,
    /// Human-readable order number.
    pub order_number: String,
    /// Shipment date.
    pub date: NaiveDate,
    /// Inventory cost.
    pub cost: Decimal,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A customer payment was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceivedEvent {
    /// Upstream payment id.
    pub payment_id: Uuid,
    /// Order the payment settles, for descriptions.
    pub order_number: String,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A courier remitted collected COD cash, net of its charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodRemittanceEvent {
    /// Upstream remittance id.
    pub remittance_id: Uuid,
    /// Courier or remittance reference, for descriptions.
    pub remittance_number: String,
    /// Remittance date.
    pub date: NaiveDate,
    /// Cash collected from customers.
    pub gross_amount: Decimal,
    /// Fees withheld by the courier.
    pub courier_charges: Decimal,
    /// Amount deposited (`gross - charges`).
    pub net_amount: Decimal,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A refund was issued to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEvent {
    /// Upstream refund id.
    pub refund_id: Uuid,
    /// Order being refunded, for descriptions.
    pub order_number: String,
    /// Refund date.
    pub date: NaiveDate,
    /// Refunded amount.
    pub amount: Decimal,
    /// Whether the customer had already paid (cash goes out) or not (receivable shrinks).
    pub already_paid: bool,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Goods were purchased on account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    /// Upstream purchase id.
    pub purchase_id: Uuid,
    /// Purchase or bill number, for descriptions.
    pub purchase_number: String,
    /// Purchase date.
    pub date: NaiveDate,
    /// Purchase amount.
    pub amount: Decimal,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A supplier bill was paid, in full or as one installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPaymentEvent {
    /// Upstream id of this payment; each installment has its own.
    pub bill_payment_id: Uuid,
    /// Purchase or bill number, for descriptions.
    pub purchase_number: String,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// User that triggered the event.
    #[serde(default)]
    pub user_id: Option<UserId>,
}
