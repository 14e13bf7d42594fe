//! Journal domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, FiscalPeriodId, JournalEntryId, JournalLineId, PageRequest, UserId};
use uuid::Uuid;

use super::error::LedgerError;
use super::validation::BALANCE_TOLERANCE;

/// Journal entry status.
///
/// Entries start as DRAFT, become POSTED, and a POSTED entry can be REVERSED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Editable, not yet authoritative.
    Draft,
    /// Authoritative and immutable.
    Posted,
    /// Superseded by a posted reversal.
    Reversed,
}

impl EntryStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Reversed => "REVERSED",
        }
    }

    /// Returns true if the entry's lines count towards balances.
    ///
    /// A reversed entry was posted; its effect is cancelled by its own posted reversal.
    #[must_use]
    pub const fn affects_balances(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "POSTED" => Ok(Self::Posted),
            "REVERSED" => Ok(Self::Reversed),
            _ => Err(LedgerError::InvalidStatus(s.to_string())),
        }
    }
}

/// Kind of business object an entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    /// Customer order.
    Order,
    /// Incoming payment.
    Payment,
    /// Customer refund.
    Refund,
    /// Supplier purchase or bill.
    Purchase,
    /// Manual adjustment.
    Adjustment,
    /// Courier cash-on-delivery remittance.
    CodRemittance,
}

impl ReferenceType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Payment => "PAYMENT",
            Self::Refund => "REFUND",
            Self::Purchase => "PURCHASE",
            Self::Adjustment => "ADJUSTMENT",
            Self::CodRemittance => "COD_REMITTANCE",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORDER" => Ok(Self::Order),
            "PAYMENT" => Ok(Self::Payment),
            "REFUND" => Ok(Self::Refund),
            "PURCHASE" => Ok(Self::Purchase),
            "ADJUSTMENT" => Ok(Self::Adjustment),
            "COD_REMITTANCE" => Ok(Self::CodRemittance),
            _ => Err(LedgerError::InvalidReferenceType(s.to_string())),
        }
    }
}

/// Tagged link from an entry to the business object it records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryReference {
    /// Kind of business object.
    pub kind: ReferenceType,
    /// Identifier owned by the upstream system.
    pub id: Uuid,
}

impl EntryReference {
    /// Creates a reference.
    #[must_use]
    pub const fn new(kind: ReferenceType, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Rebuilds a reference from its stored columns.
    ///
    /// Both columns must be present or both absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is unknown or only one column is set.
    pub fn from_parts(kind: Option<&str>, id: Option<Uuid>) -> Result<Option<Self>, LedgerError> {
        match (kind, id) {
            (None, None) => Ok(None),
            (Some(kind), Some(id)) => Ok(Some(Self::new(kind.parse()?, id))),
            (Some(kind), None) => Err(LedgerError::InvalidReferenceType(format!(
                "{kind} without reference id"
            ))),
            (None, Some(id)) => Err(LedgerError::InvalidReferenceType(format!(
                "reference id {id} without type"
            ))),
        }
    }
}

/// Auto-entry rule that produced an entry.
///
/// Together with the reference it forms the idempotency key of automatic postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceRule {
    /// Order shipped: receivable against revenue.
    OrderShipped,
    /// Cost of goods sold for a shipped order.
    CostOfGoodsSold,
    /// Payment received against a receivable.
    PaymentReceived,
    /// Courier COD remittance.
    CodRemittance,
    /// Customer refund.
    Refund,
    /// Purchase on account.
    Purchase,
    /// Settlement of a supplier bill.
    BillPayment,
}

impl SourceRule {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderShipped => "ORDER_SHIPPED",
            Self::CostOfGoodsSold => "COST_OF_GOODS_SOLD",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::CodRemittance => "COD_REMITTANCE",
            Self::Refund => "REFUND",
            Self::Purchase => "PURCHASE",
            Self::BillPayment => "BILL_PAYMENT",
        }
    }

    /// Reference kind used by entries of this rule.
    #[must_use]
    pub const fn reference_type(self) -> ReferenceType {
        match self {
            Self::OrderShipped | Self::CostOfGoodsSold => ReferenceType::Order,
            Self::PaymentReceived | Self::BillPayment => ReferenceType::Payment,
            Self::CodRemittance => ReferenceType::CodRemittance,
            Self::Refund => ReferenceType::Refund,
            Self::Purchase => ReferenceType::Purchase,
        }
    }
}

impl fmt::Display for SourceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceRule {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORDER_SHIPPED" => Ok(Self::OrderShipped),
            "COST_OF_GOODS_SOLD" => Ok(Self::CostOfGoodsSold),
            "PAYMENT_RECEIVED" => Ok(Self::PaymentReceived),
            "COD_REMITTANCE" => Ok(Self::CodRemittance),
            "REFUND" => Ok(Self::Refund),
            "PURCHASE" => Ok(Self::Purchase),
            "BILL_PAYMENT" => Ok(Self::BillPayment),
            _ => Err(LedgerError::InvalidSourceRule(s.to_string())),
        }
    }
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Debit amount (zero if credit).
    pub debit: Decimal,
    /// Credit amount (zero if debit).
    pub credit: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
    /// 1-based position within the entry.
    pub line_number: i32,
}

/// A journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Human-readable unique number (`JE-YYYYMMDD-XXXXXXXX`).
    pub entry_number: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// Origin of the entry.
    pub reference: Option<EntryReference>,
    /// Current status.
    pub status: EntryStatus,
    /// Period covering `date` at creation time.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Entry that reverses this one. Set only on the original.
    pub reversed_entry_id: Option<JournalEntryId>,
    /// User that created the entry.
    pub created_by: Option<UserId>,
    /// Auto-entry rule that created the entry.
    pub source_rule: Option<SourceRule>,
    /// Lines in insertion order.
    pub lines: Vec<JournalLine>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Returns the debit and credit totals of the entry.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::from_amounts(self.lines.iter().map(|l| (l.debit, l.credit)))
    }
}

/// A line to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
    /// Optional memo.
    #[serde(default)]
    pub memo: Option<String>,
}

impl JournalLineInput {
    /// A debit line.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJournalEntryData {
    /// Accounting date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// Origin of the entry.
    #[serde(default)]
    pub reference: Option<EntryReference>,
    /// Lines to write.
    pub lines: Vec<JournalLineInput>,
    /// User creating the entry.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Auto-entry rule creating the entry.
    #[serde(default)]
    pub source_rule: Option<SourceRule>,
}

impl CreateJournalEntryData {
    /// Creates manual entry data without reference or user.
    #[must_use]
    pub fn new(date: NaiveDate, description: impl Into<String>, lines: Vec<JournalLineInput>) -> Self {
        Self {
            date,
            description: description.into(),
            reference: None,
            lines,
            user_id: None,
            source_rule: None,
        }
    }

    /// Sets the reference.
    #[must_use]
    pub const fn with_reference(mut self, reference: EntryReference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Sets the creating user.
    #[must_use]
    pub const fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Debit and credit totals of a line set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums `(debit, credit)` pairs.
    pub fn from_amounts(amounts: impl IntoIterator<Item = (Decimal, Decimal)>) -> Self {
        amounts
            .into_iter()
            .fold(Self::default(), |acc, (debit, credit)| Self {
                debit: acc.debit + debit,
                credit: acc.credit + credit,
            })
    }

    /// `debit - credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// True when the difference is within [`BALANCE_TOLERANCE`].
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.difference().abs() <= BALANCE_TOLERANCE
    }
}

/// Filter for listing journal entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryFilter {
    /// Entries with at least one line on this account.
    pub account_id: Option<AccountId>,
    /// Entries dated on or after.
    pub from_date: Option<NaiveDate>,
    /// Entries dated on or before.
    pub to_date: Option<NaiveDate>,
    /// Entries with this reference kind.
    pub reference_type: Option<ReferenceType>,
    /// Entries in this status.
    pub status: Option<EntryStatus>,
    /// Paging.
    #[serde(default)]
    pub page: PageRequest,
}
