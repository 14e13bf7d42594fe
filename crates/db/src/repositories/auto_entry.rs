//! Auto-entry service: turns business events into posted journal entries.
//!
//! Each entry point resolves the registry's account codes, derives the line set
//! with `AutoEntryRules`, then creates and posts the entry inside one
//! transaction. An event recorded twice for the same rule and reference fails
//! with `DuplicateEvent`, whether caught by the pre-check or by the unique
//! index on `(reference_type, reference_id, source_rule)`.

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tally_core::account::AccountCodeRegistry;
use tally_core::auto_entry::{
    AutoEntryError, AutoEntryRules, BillPaymentEvent, CodRemittanceEvent, CogsEvent,
    OrderShippedEvent, PaymentReceivedEvent, PurchaseEvent, RefundEvent, ResolvedAccounts,
};
use tally_core::ledger::{CreateJournalEntryData, JournalEntry, LedgerError};
use tracing::{info, warn};

use super::account::AccountRepository;
use super::journal::JournalRepository;

/// Entries recorded for a shipped order.
#[derive(Debug, Clone)]
pub struct ShipmentEntries {
    /// Receivable and revenue entry.
    pub revenue: JournalEntry,
    /// Cost of goods sold entry, when the event carried a cost.
    pub cogs: Option<JournalEntry>,
}

/// Records automatic journal entries for business events.
#[derive(Debug, Clone)]
pub struct AutoEntryService {
    db: DatabaseConnection,
    registry: AccountCodeRegistry,
}

impl AutoEntryService {
    /// Creates a new service using the given account code registry.
    #[must_use]
    pub const fn new(db: DatabaseConnection, registry: AccountCodeRegistry) -> Self {
        Self { db, registry }
    }

    /// The account code registry used to resolve accounts.
    #[must_use]
    pub const fn registry(&self) -> &AccountCodeRegistry {
        &self.registry
    }

    /// Order shipped, followed by its COGS entry when a cost is supplied.
    ///
    /// Both entries commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn order_shipped(
        &self,
        event: &OrderShippedEvent,
    ) -> Result<ShipmentEntries, AutoEntryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AutoEntryError::Database(e.to_string()))?;

        let accounts = self.resolve_in(&txn).await?;
        let data = AutoEntryRules::order_shipped(event, &accounts)?;
        let revenue = Self::record_in(&txn, data).await?;

        let cogs = match event.cogs_event() {
            Some(cogs_event) => {
                let data = AutoEntryRules::cogs(&cogs_event, &accounts)?;
                Some(Self::record_in(&txn, data).await?)
            }
            None => None,
        };

        txn.commit()
            .await
            .map_err(|e| AutoEntryError::Database(e.to_string()))?;

        Ok(ShipmentEntries { revenue, cogs })
    }

    /// Cost of goods sold for an order.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive cost, missing accounts, or a duplicate event.
    pub async fn cogs(&self, event: &CogsEvent) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::cogs(event, accounts)).await
    }

    /// Payment received against an order.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn payment_received(
        &self,
        event: &PaymentReceivedEvent,
    ) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::payment_received(event, accounts))
            .await
    }

    /// COD remittance received from a courier.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn cod_remittance(
        &self,
        event: &CodRemittanceEvent,
    ) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::cod_remittance(event, accounts))
            .await
    }

    /// Refund issued for an order.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn refund(&self, event: &RefundEvent) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::refund(event, accounts))
            .await
    }

    /// Purchase received into inventory.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn purchase(&self, event: &PurchaseEvent) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::purchase(event, accounts))
            .await
    }

    /// Supplier bill paid.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid amounts, missing accounts, or a duplicate event.
    pub async fn bill_payment(
        &self,
        event: &BillPaymentEvent,
    ) -> Result<JournalEntry, AutoEntryError> {
        self.run(|accounts| AutoEntryRules::bill_payment(event, accounts))
            .await
    }

    async fn run<F>(&self, build: F) -> Result<JournalEntry, AutoEntryError>
    where
        F: FnOnce(&ResolvedAccounts) -> Result<CreateJournalEntryData, AutoEntryError>,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AutoEntryError::Database(e.to_string()))?;

        let accounts = self.resolve_in(&txn).await?;
        let data = build(&accounts)?;
        let entry = Self::record_in(&txn, data).await?;

        txn.commit()
            .await
            .map_err(|e| AutoEntryError::Database(e.to_string()))?;
        Ok(entry)
    }

    async fn resolve_in<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<ResolvedAccounts, AutoEntryError> {
        let by_code = AccountRepository::ids_by_codes_in(conn, &self.registry.codes())
            .await
            .map_err(|e| AutoEntryError::Database(e.to_string()))?;
        Ok(ResolvedAccounts::resolve(&self.registry, &by_code))
    }

    /// Creates and posts one derived entry on `conn`.
    async fn record_in<C: ConnectionTrait>(
        conn: &C,
        data: CreateJournalEntryData,
    ) -> Result<JournalEntry, AutoEntryError> {
        if let (Some(rule), Some(reference)) = (data.source_rule, data.reference)
            && let Some(existing) = JournalRepository::find_by_source_in(conn, rule, reference.id).await?
        {
            warn!(
                rule = %rule,
                reference_type = %reference.kind,
                reference_id = %reference.id,
                existing_entry = %existing.entry_number,
                "Duplicate auto-entry event"
            );
            return Err(AutoEntryError::DuplicateEvent {
                rule,
                reference_type: reference.kind,
                reference_id: reference.id,
            });
        }

        let entry = JournalRepository::create_in(conn, data)
            .await
            .map_err(duplicate_event)?;
        let entry = JournalRepository::post_in(conn, entry.id).await?;

        info!(
            entry_id = %entry.id,
            entry_number = %entry.entry_number,
            source_rule = ?entry.source_rule,
            "Auto-entry posted"
        );
        Ok(entry)
    }
}

fn duplicate_event(err: LedgerError) -> AutoEntryError {
    match err {
        LedgerError::DuplicateSource {
            rule,
            reference_type,
            reference_id,
        } => AutoEntryError::DuplicateEvent {
            rule,
            reference_type,
            reference_id,
        },
        other => other.into(),
    }
}
