//! Integration tests for automatic journal entries.

mod common;

use rust_decimal_macros::dec;
use tally_core::account::{AccountCodeRegistry, AccountRole};
use tally_core::auto_entry::{
    AutoEntryError, BillPaymentEvent, CodRemittanceEvent, OrderShippedEvent, PaymentMethod,
    PaymentReceivedEvent, PurchaseEvent, RefundEvent,
};
use tally_core::ledger::{
    EntryReference, EntryStatus, JournalEntryFilter, ReferenceType, SourceRule,
};
use tally_db::{AutoEntryService, BalanceRepository, JournalRepository};
use uuid::Uuid;

use common::{account_id, date, setup_db, setup_with_accounts};

fn shipped(order_id: Uuid, cost_amount: Option<rust_decimal::Decimal>) -> OrderShippedEvent {
    OrderShippedEvent {
        order_id,
        order_number: "ORD-1001".to_string(),
        date: date(2026, 6, 3),
        total: dec!(1000),
        shipping_charges: dec!(100),
        cost_amount,
        user_id: None,
    }
}

#[tokio::test]
async fn test_order_shipped_posts_receivable_and_revenue() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let balances = BalanceRepository::new(db.clone());

    let receivable = account_id(&db, AccountRole::AccountsReceivable).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;
    let shipping = account_id(&db, AccountRole::ShippingRevenue).await;

    let order_id = Uuid::new_v4();
    let recorded = service.order_shipped(&shipped(order_id, None)).await.unwrap();
    assert!(recorded.cogs.is_none());

    let entry = recorded.revenue;
    assert_eq!(entry.status, EntryStatus::Posted);
    assert_eq!(entry.source_rule, Some(SourceRule::OrderShipped));
    assert_eq!(
        entry.reference,
        Some(EntryReference::new(ReferenceType::Order, order_id))
    );

    let lines: Vec<_> = entry
        .lines
        .iter()
        .map(|l| (l.account_id, l.debit, l.credit))
        .collect();
    assert_eq!(
        lines,
        vec![
            (receivable, dec!(1000), dec!(0)),
            (sales, dec!(0), dec!(900)),
            (shipping, dec!(0), dec!(100)),
        ]
    );

    let ar = balances.account_balance(receivable, None, None).await.unwrap();
    assert_eq!(ar.balance, dec!(1000));
    let revenue = balances.account_balance(sales, None, None).await.unwrap();
    assert_eq!(revenue.balance, dec!(900));

    let trial = balances.trial_balance(None).await.unwrap();
    assert_eq!(trial.total_debit, dec!(1000));
    assert_eq!(trial.total_credit, dec!(1000));
    assert!(trial.is_balanced);
}

#[tokio::test]
async fn test_order_shipped_with_cost_records_cogs() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let balances = BalanceRepository::new(db.clone());

    let cogs = account_id(&db, AccountRole::CostOfGoodsSold).await;
    let inventory = account_id(&db, AccountRole::Inventory).await;

    let recorded = service
        .order_shipped(&shipped(Uuid::new_v4(), Some(dec!(600))))
        .await
        .unwrap();
    let cogs_entry = recorded.cogs.expect("cogs entry");
    assert_eq!(cogs_entry.source_rule, Some(SourceRule::CostOfGoodsSold));
    assert_eq!(cogs_entry.reference, recorded.revenue.reference);
    assert_eq!(cogs_entry.status, EntryStatus::Posted);

    let expense = balances.account_balance(cogs, None, None).await.unwrap();
    assert_eq!(expense.balance, dec!(600));
    let stock = balances.account_balance(inventory, None, None).await.unwrap();
    assert_eq!(stock.balance, dec!(-600));
}

#[tokio::test]
async fn test_duplicate_event_is_rejected() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let journal = JournalRepository::new(db.clone());

    let order_id = Uuid::new_v4();
    service
        .order_shipped(&shipped(order_id, Some(dec!(600))))
        .await
        .unwrap();

    let err = service
        .order_shipped(&shipped(order_id, Some(dec!(600))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutoEntryError::DuplicateEvent {
            rule: SourceRule::OrderShipped,
            reference_type: ReferenceType::Order,
            reference_id,
        } if reference_id == order_id
    ));

    let entries = journal
        .get_by_reference(EntryReference::new(ReferenceType::Order, order_id))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_reversing_an_auto_entry_restores_balances() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let journal = JournalRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());
    let receivable = account_id(&db, AccountRole::AccountsReceivable).await;

    let order_id = Uuid::new_v4();
    let recorded = service.order_shipped(&shipped(order_id, None)).await.unwrap();
    journal.reverse(recorded.revenue.id, None).await.unwrap();

    let ar = balances.account_balance(receivable, None, None).await.unwrap();
    assert_eq!(ar.debit_total, dec!(1000));
    assert_eq!(ar.credit_total, dec!(1000));
    assert_eq!(ar.balance, dec!(0));

    let err = service
        .order_shipped(&shipped(order_id, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AutoEntryError::DuplicateEvent { .. }));
}

#[tokio::test]
async fn test_payment_and_remittance_settle_receivable() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let balances = BalanceRepository::new(db.clone());

    let receivable = account_id(&db, AccountRole::AccountsReceivable).await;
    let bank = account_id(&db, AccountRole::Bank).await;
    let courier = account_id(&db, AccountRole::CourierCharges).await;
    let cash = account_id(&db, AccountRole::Cash).await;

    service.order_shipped(&shipped(Uuid::new_v4(), None)).await.unwrap();

    let payment = service
        .payment_received(&PaymentReceivedEvent {
            payment_id: Uuid::new_v4(),
            order_number: "ORD-1001".to_string(),
            date: date(2026, 6, 4),
            amount: dec!(500),
            method: PaymentMethod::Card,
            user_id: None,
        })
        .await
        .unwrap();
    assert_eq!(payment.lines[0].account_id, bank);
    assert_eq!(
        payment.reference.map(|r| r.kind),
        Some(ReferenceType::Payment)
    );

    let remittance = service
        .cod_remittance(&CodRemittanceEvent {
            remittance_id: Uuid::new_v4(),
            remittance_number: "REM-7".to_string(),
            date: date(2026, 6, 10),
            gross_amount: dec!(500),
            courier_charges: dec!(50),
            net_amount: dec!(450),
            user_id: None,
        })
        .await
        .unwrap();
    let lines: Vec<_> = remittance
        .lines
        .iter()
        .map(|l| (l.account_id, l.debit, l.credit))
        .collect();
    assert_eq!(
        lines,
        vec![
            (bank, dec!(450), dec!(0)),
            (courier, dec!(50), dec!(0)),
            (receivable, dec!(0), dec!(500)),
        ]
    );

    let ar = balances.account_balance(receivable, None, None).await.unwrap();
    assert_eq!(ar.balance, dec!(0));
    let bank_balance = balances.account_balance(bank, None, None).await.unwrap();
    assert_eq!(bank_balance.balance, dec!(950));
    let cash_balance = balances.account_balance(cash, None, None).await.unwrap();
    assert_eq!(cash_balance.balance, dec!(0));
}

#[tokio::test]
async fn test_unbalanced_remittance_is_rejected() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let journal = JournalRepository::new(db.clone());

    let err = service
        .cod_remittance(&CodRemittanceEvent {
            remittance_id: Uuid::new_v4(),
            remittance_number: "REM-8".to_string(),
            date: date(2026, 6, 10),
            gross_amount: dec!(500),
            courier_charges: dec!(50),
            net_amount: dec!(400),
            user_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AutoEntryError::Ledger(_)));
    assert_eq!(
        journal.list(JournalEntryFilter::default()).await.unwrap().total,
        0
    );
}

#[tokio::test]
async fn test_refund_credits_cash_or_receivable() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());

    let returns = account_id(&db, AccountRole::SalesReturns).await;
    let cash = account_id(&db, AccountRole::Cash).await;
    let receivable = account_id(&db, AccountRole::AccountsReceivable).await;

    let paid = service
        .refund(&RefundEvent {
            refund_id: Uuid::new_v4(),
            order_number: "ORD-1001".to_string(),
            date: date(2026, 6, 12),
            amount: dec!(80),
            already_paid: true,
            user_id: None,
        })
        .await
        .unwrap();
    assert_eq!(paid.lines[0].account_id, returns);
    assert_eq!(paid.lines[0].debit, dec!(80));
    assert_eq!(paid.lines[1].account_id, cash);
    assert_eq!(paid.lines[1].credit, dec!(80));

    let unpaid = service
        .refund(&RefundEvent {
            refund_id: Uuid::new_v4(),
            order_number: "ORD-1002".to_string(),
            date: date(2026, 6, 12),
            amount: dec!(30),
            already_paid: false,
            user_id: None,
        })
        .await
        .unwrap();
    assert_eq!(unpaid.lines[1].account_id, receivable);
}

#[tokio::test]
async fn test_purchase_and_bill_payment() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let balances = BalanceRepository::new(db.clone());

    let payable = account_id(&db, AccountRole::AccountsPayable).await;
    let inventory = account_id(&db, AccountRole::Inventory).await;

    let purchase_id = Uuid::new_v4();
    service
        .purchase(&PurchaseEvent {
            purchase_id,
            purchase_number: "PO-55".to_string(),
            date: date(2026, 6, 1),
            amount: dec!(700),
            user_id: None,
        })
        .await
        .unwrap();

    let ap = balances.account_balance(payable, None, None).await.unwrap();
    assert_eq!(ap.balance, dec!(700));

    let payment = service
        .bill_payment(&bill_payment(Uuid::new_v4(), dec!(700)))
        .await
        .unwrap();
    assert_eq!(payment.source_rule, Some(SourceRule::BillPayment));
    assert_eq!(payment.reference.map(|r| r.kind), Some(ReferenceType::Payment));

    let ap = balances.account_balance(payable, None, None).await.unwrap();
    assert_eq!(ap.balance, dec!(0));
    let stock = balances.account_balance(inventory, None, None).await.unwrap();
    assert_eq!(stock.balance, dec!(700));
}

fn bill_payment(bill_payment_id: Uuid, amount: rust_decimal::Decimal) -> BillPaymentEvent {
    BillPaymentEvent {
        bill_payment_id,
        purchase_number: "PO-55".to_string(),
        date: date(2026, 6, 20),
        amount,
        method: PaymentMethod::Cash,
        user_id: None,
    }
}

#[tokio::test]
async fn test_bill_paid_in_installments() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());
    let balances = BalanceRepository::new(db.clone());
    let payable = account_id(&db, AccountRole::AccountsPayable).await;

    service
        .purchase(&PurchaseEvent {
            purchase_id: Uuid::new_v4(),
            purchase_number: "PO-55".to_string(),
            date: date(2026, 6, 1),
            amount: dec!(700),
            user_id: None,
        })
        .await
        .unwrap();

    let first_id = Uuid::new_v4();
    service
        .bill_payment(&bill_payment(first_id, dec!(300)))
        .await
        .unwrap();
    service
        .bill_payment(&bill_payment(Uuid::new_v4(), dec!(400)))
        .await
        .unwrap();

    let ap = balances.account_balance(payable, None, None).await.unwrap();
    assert_eq!(ap.debit_total, dec!(700));
    assert_eq!(ap.balance, dec!(0));

    let err = service
        .bill_payment(&bill_payment(first_id, dec!(300)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutoEntryError::DuplicateEvent {
            rule: SourceRule::BillPayment,
            reference_type: ReferenceType::Payment,
            reference_id,
        } if reference_id == first_id
    ));
}

#[tokio::test]
async fn test_uninitialized_accounts() {
    let db = setup_db().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());

    let err = service
        .payment_received(&PaymentReceivedEvent {
            payment_id: Uuid::new_v4(),
            order_number: "ORD-1".to_string(),
            date: date(2026, 6, 4),
            amount: dec!(10),
            method: PaymentMethod::Cash,
            user_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutoEntryError::AccountingNotInitialized { role: AccountRole::Cash, code } if code == "1000"
    ));
}

#[tokio::test]
async fn test_invalid_event_amount() {
    let db = setup_with_accounts().await;
    let service = AutoEntryService::new(db.clone(), AccountCodeRegistry::default());

    let mut event = shipped(Uuid::new_v4(), None);
    event.total = dec!(0);
    let err = service.order_shipped(&event).await.unwrap_err();
    assert!(matches!(err, AutoEntryError::InvalidEvent(_)));
}
