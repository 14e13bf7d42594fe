//! Derivation rules from business events to journal entry data.
//!
//! Every rule:
//! - validates the event amounts
//! - resolves the accounts it needs by role (a missing one is a hard failure)
//! - emits only non-zero lines
//! - stamps the entry with its reference and source rule

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, UserId};
use uuid::Uuid;

use super::error::AutoEntryError;
use super::events::{
    BillPaymentEvent, CodRemittanceEvent, CogsEvent, OrderShippedEvent, PaymentReceivedEvent,
    PurchaseEvent, RefundEvent,
};
use crate::account::{AccountCodeRegistry, AccountRole};
use crate::ledger::{CreateJournalEntryData, EntryReference, JournalLineInput, SourceRule};

/// System accounts resolved from the registry.
#[derive(Debug, Clone)]
pub struct ResolvedAccounts {
    ids: BTreeMap<AccountRole, AccountId>,
    registry: AccountCodeRegistry,
}

impl ResolvedAccounts {
    /// Resolves every registry role against a `code -> id` map of existing accounts.
    #[must_use]
    pub fn resolve(registry: &AccountCodeRegistry, by_code: &HashMap<String, AccountId>) -> Self {
        let ids = AccountRole::ALL
            .into_iter()
            .filter_map(|role| by_code.get(registry.code(role)).map(|id| (role, *id)))
            .collect();
        Self {
            ids,
            registry: registry.clone(),
        }
    }

    /// Returns the account for a role, if it exists.
    #[must_use]
    pub fn get(&self, role: AccountRole) -> Option<AccountId> {
        self.ids.get(&role).copied()
    }

    /// Returns the account for a role.
    ///
    /// # Errors
    ///
    /// Returns `AccountingNotInitialized` if the account does not exist.
    pub fn require(&self, role: AccountRole) -> Result<AccountId, AutoEntryError> {
        self.get(role)
            .ok_or_else(|| AutoEntryError::AccountingNotInitialized {
                role,
                code: self.registry.code(role).to_string(),
            })
    }
}

/// Line set under construction; zero amounts are dropped.
#[derive(Default)]
struct LineSet(Vec<JournalLineInput>);

impl LineSet {
    fn debit(&mut self, account_id: AccountId, amount: Decimal, memo: &str) {
        if amount > Decimal::ZERO {
            self.0.push(JournalLineInput::debit(account_id, amount).with_memo(memo));
        }
    }

    fn credit(&mut self, account_id: AccountId, amount: Decimal, memo: &str) {
        if amount > Decimal::ZERO {
            self.0.push(JournalLineInput::credit(account_id, amount).with_memo(memo));
        }
    }

    fn into_entry(
        self,
        rule: SourceRule,
        reference_id: Uuid,
        event_date: NaiveDate,
        description: String,
        user_id: Option<UserId>,
    ) -> CreateJournalEntryData {
        CreateJournalEntryData {
            date: event_date,
            description,
            reference: Some(EntryReference::new(rule.reference_type(), reference_id)),
            lines: self.0,
            user_id,
            source_rule: Some(rule),
        }
    }
}

fn non_negative(field: &str, amount: Decimal) -> Result<(), AutoEntryError> {
    if amount < Decimal::ZERO {
        return Err(AutoEntryError::InvalidEvent(format!(
            "{field} cannot be negative: {amount}"
        )));
    }
    Ok(())
}

fn positive(field: &str, amount: Decimal) -> Result<(), AutoEntryError> {
    if amount <= Decimal::ZERO {
        return Err(AutoEntryError::InvalidEvent(format!(
            "{field} must be positive: {amount}"
        )));
    }
    Ok(())
}

/// Stateless auto-entry rules.
pub struct AutoEntryRules;

impl AutoEntryRules {
    /// Order shipped: debit AR for the total, credit Sales Revenue for the goods
    /// and Shipping Revenue for the shipping charges.
    ///
    /// Without a Shipping Revenue account the charges are credited to Sales Revenue.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts or missing accounts.
    pub fn order_shipped(
        event: &OrderShippedEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("total", event.total)?;
        non_negative("shipping_charges", event.shipping_charges)?;
        if event.shipping_charges > event.total {
            return Err(AutoEntryError::InvalidEvent(format!(
                "shipping_charges {} exceed total {}",
                event.shipping_charges, event.total
            )));
        }

        let receivable = accounts.require(AccountRole::AccountsReceivable)?;
        let sales = accounts.require(AccountRole::SalesRevenue)?;

        let mut sales_amount = event.total - event.shipping_charges;
        let mut shipping = None;
        if event.shipping_charges > Decimal::ZERO {
            match accounts.get(AccountRole::ShippingRevenue) {
                Some(id) => shipping = Some((id, event.shipping_charges)),
                None => sales_amount += event.shipping_charges,
            }
        }

        let mut lines = LineSet::default();
        lines.debit(receivable, event.total, "Accounts receivable");
        lines.credit(sales, sales_amount, "Sales revenue");
        if let Some((id, amount)) = shipping {
            lines.credit(id, amount, "Shipping revenue");
        }

        Ok(lines.into_entry(
            SourceRule::OrderShipped,
            event.order_id,
            event.date,
            format!("Order {} shipped", event.order_number),
            event.user_id,
        ))
    }

    /// Cost of goods sold: debit COGS, credit Inventory.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive cost or missing accounts.
    pub fn cogs(
        event: &CogsEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("cost", event.cost)?;
        let cogs = accounts.require(AccountRole::CostOfGoodsSold)?;
        let inventory = accounts.require(AccountRole::Inventory)?;

        let mut lines = LineSet::default();
        lines.debit(cogs, event.cost, "Cost of goods sold");
        lines.credit(inventory, event.cost, "Inventory");

        Ok(lines.into_entry(
            SourceRule::CostOfGoodsSold,
            event.order_id,
            event.date,
            format!("Cost of goods sold for order {}", event.order_number),
            event.user_id,
        ))
    }

    /// Payment received: debit Cash or Bank by method, credit AR.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount or missing accounts.
    pub fn payment_received(
        event: &PaymentReceivedEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("amount", event.amount)?;
        let settlement = accounts.require(event.method.settlement_role())?;
        let receivable = accounts.require(AccountRole::AccountsReceivable)?;

        let mut lines = LineSet::default();
        lines.debit(settlement, event.amount, event.method.as_str());
        lines.credit(receivable, event.amount, "Accounts receivable");

        Ok(lines.into_entry(
            SourceRule::PaymentReceived,
            event.payment_id,
            event.date,
            format!(
                "Payment received for order {} ({})",
                event.order_number, event.method
            ),
            event.user_id,
        ))
    }

    /// COD remittance: debit Bank for the net, debit Courier Charges for the fees,
    /// credit AR for the gross.
    ///
    /// `net = gross - charges` is enforced by the ledger's balance check.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts or missing accounts.
    pub fn cod_remittance(
        event: &CodRemittanceEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("gross_amount", event.gross_amount)?;
        non_negative("courier_charges", event.courier_charges)?;
        non_negative("net_amount", event.net_amount)?;

        let bank = accounts.require(AccountRole::Bank)?;
        let receivable = accounts.require(AccountRole::AccountsReceivable)?;
        let courier = if event.courier_charges > Decimal::ZERO {
            Some(accounts.require(AccountRole::CourierCharges)?)
        } else {
            None
        };

        let mut lines = LineSet::default();
        lines.debit(bank, event.net_amount, "COD remittance deposit");
        if let Some(courier) = courier {
            lines.debit(courier, event.courier_charges, "Courier charges");
        }
        lines.credit(receivable, event.gross_amount, "Accounts receivable");

        Ok(lines.into_entry(
            SourceRule::CodRemittance,
            event.remittance_id,
            event.date,
            format!("COD remittance {}", event.remittance_number),
            event.user_id,
        ))
    }

    /// Refund: debit Sales Returns, credit Cash if the customer had paid, else AR.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount or missing accounts.
    pub fn refund(
        event: &RefundEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("amount", event.amount)?;
        let returns = accounts.require(AccountRole::SalesReturns)?;
        let (source, memo) = if event.already_paid {
            (accounts.require(AccountRole::Cash)?, "Cash refunded")
        } else {
            (
                accounts.require(AccountRole::AccountsReceivable)?,
                "Accounts receivable",
            )
        };

        let mut lines = LineSet::default();
        lines.debit(returns, event.amount, "Sales returns");
        lines.credit(source, event.amount, memo);

        Ok(lines.into_entry(
            SourceRule::Refund,
            event.refund_id,
            event.date,
            format!("Refund for order {}", event.order_number),
            event.user_id,
        ))
    }

    /// Purchase on account: debit Inventory, credit AP.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount or missing accounts.
    pub fn purchase(
        event: &PurchaseEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("amount", event.amount)?;
        let inventory = accounts.require(AccountRole::Inventory)?;
        let payable = accounts.require(AccountRole::AccountsPayable)?;

        let mut lines = LineSet::default();
        lines.debit(inventory, event.amount, "Inventory");
        lines.credit(payable, event.amount, "Accounts payable");

        Ok(lines.into_entry(
            SourceRule::Purchase,
            event.purchase_id,
            event.date,
            format!("Purchase {}", event.purchase_number),
            event.user_id,
        ))
    }

    /// Bill payment: debit AP, credit Cash or Bank by method.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount or missing accounts.
    pub fn bill_payment(
        event: &BillPaymentEvent,
        accounts: &ResolvedAccounts,
    ) -> Result<CreateJournalEntryData, AutoEntryError> {
        positive("amount", event.amount)?;
        let payable = accounts.require(AccountRole::AccountsPayable)?;
        let settlement = accounts.require(event.method.settlement_role())?;

        let mut lines = LineSet::default();
        lines.debit(payable, event.amount, "Accounts payable");
        lines.credit(settlement, event.amount, event.method.as_str());

        Ok(lines.into_entry(
            SourceRule::BillPayment,
            event.bill_payment_id,
            event.date,
            format!(
                "Bill payment for purchase {} ({})",
                event.purchase_number, event.method
            ),
            event.user_id,
        ))
    }
}
