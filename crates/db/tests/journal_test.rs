//! Integration tests for the journal state machine.

mod common;

use rust_decimal_macros::dec;
use tally_core::account::AccountRole;
use tally_core::fiscal::CreateFiscalPeriodInput;
use tally_core::ledger::{
    CreateJournalEntryData, EntryReference, EntryStatus, JournalEntryFilter, JournalLineInput,
    LedgerError, ReferenceType,
};
use tally_db::{FiscalRepository, JournalRepository};
use tally_shared::types::{AccountId, JournalEntryId, PageRequest, UserId};
use uuid::Uuid;

use common::{account_id, date, setup_with_accounts, simple_entry};

#[tokio::test]
async fn test_create_entry_as_draft() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;
    let shipping = account_id(&db, AccountRole::ShippingRevenue).await;

    let user = UserId::new();
    let data = CreateJournalEntryData::new(
        date(2026, 4, 12),
        "Counter sale",
        vec![
            JournalLineInput::debit(cash, dec!(120)).with_memo("till"),
            JournalLineInput::credit(sales, dec!(100)),
            JournalLineInput::credit(shipping, dec!(20)),
        ],
    )
    .with_user(Some(user));

    let entry = repo.create(data).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Draft);
    assert!(entry.entry_number.starts_with("JE-20260412-"));
    assert_eq!(entry.entry_number.len(), "JE-20260412-".len() + 8);
    assert_eq!(entry.created_by, Some(user));
    assert!(entry.posted_at.is_none());
    assert!(entry.fiscal_period_id.is_none());

    let line_numbers: Vec<i32> = entry.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(line_numbers, vec![1, 2, 3]);
    assert_eq!(entry.lines[0].memo.as_deref(), Some("till"));

    let totals = entry.totals();
    assert_eq!(totals.debit, dec!(120));
    assert_eq!(totals.credit, dec!(120));

    let fetched = repo.get(entry.id).await.unwrap();
    assert_eq!(fetched.entry_number, entry.entry_number);
    assert_eq!(fetched.lines.len(), 3);
}

#[tokio::test]
async fn test_create_rejects_unbalanced_entry() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let data = CreateJournalEntryData::new(
        date(2026, 4, 12),
        "Lopsided",
        vec![
            JournalLineInput::debit(cash, dec!(100)),
            JournalLineInput::credit(sales, dec!(90)),
        ],
    );
    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unbalanced { .. }));

    let page = repo.list(JournalEntryFilter::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_create_rejects_unknown_account() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let ghost = AccountId::new();

    let err = repo
        .create(simple_entry(date(2026, 4, 12), cash, ghost, dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownAccounts(ids) if ids == vec![ghost]));
}

#[tokio::test]
async fn test_post_transitions_once() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let entry = repo
        .create(simple_entry(date(2026, 4, 12), cash, sales, dec!(40)))
        .await
        .unwrap();

    let posted = repo.post(entry.id).await.unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    assert!(posted.posted_at.is_some());

    let err = repo.post(entry.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyPosted(number) if number == entry.entry_number));

    let err = repo.post(JournalEntryId::new()).await.unwrap_err();
    assert!(matches!(err, LedgerError::EntryNotFound(_)));
}

#[tokio::test]
async fn test_post_into_closed_period() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let fiscal = FiscalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let january = fiscal
        .create(CreateFiscalPeriodInput {
            name: "January 2026".to_string(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 1, 31),
        })
        .await
        .unwrap();
    fiscal.close(january.id).await.unwrap();

    let entry = repo
        .create(simple_entry(date(2026, 1, 15), cash, sales, dec!(75)))
        .await
        .unwrap();
    assert_eq!(entry.fiscal_period_id, Some(january.id));

    let err = repo.post(entry.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::PeriodClosed(name) if name == "January 2026"));
    assert_eq!(repo.get(entry.id).await.unwrap().status, EntryStatus::Draft);

    fiscal.reopen(january.id).await.unwrap();
    let posted = repo.post(entry.id).await.unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
}

#[tokio::test]
async fn test_reverse_posted_entry() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let order_id = Uuid::new_v4();
    let data = simple_entry(date(2026, 4, 12), cash, sales, dec!(250))
        .with_reference(EntryReference::new(ReferenceType::Order, order_id));
    let entry = repo.create(data).await.unwrap();
    repo.post(entry.id).await.unwrap();

    let reverser = UserId::new();
    let original = repo.reverse(entry.id, Some(reverser)).await.unwrap();
    assert_eq!(original.status, EntryStatus::Reversed);
    let reversal_id = original.reversed_entry_id.expect("reversal linked");

    let stored = repo.get(entry.id).await.unwrap();
    assert_eq!(stored.status, EntryStatus::Reversed);
    assert_eq!(stored.reversed_entry_id, Some(reversal_id));

    let reversal = repo.get(reversal_id).await.unwrap();
    assert_eq!(reversal.status, EntryStatus::Posted);
    assert_eq!(reversal.created_by, Some(reverser));
    assert_eq!(reversal.reference, entry.reference);
    assert!(reversal.source_rule.is_none());
    assert!(reversal.description.starts_with("Reversal of "));
    assert_eq!(reversal.lines.len(), 2);
    assert_eq!(reversal.lines[0].account_id, cash);
    assert_eq!(reversal.lines[0].credit, dec!(250));
    assert_eq!(reversal.lines[0].debit, dec!(0));
    assert_eq!(reversal.lines[1].account_id, sales);
    assert_eq!(reversal.lines[1].debit, dec!(250));

    let err = repo.reverse(entry.id, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotPosted { status: EntryStatus::Reversed, .. }));

    let err = repo.post(entry.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::CannotPostReversed(_)));
}

#[tokio::test]
async fn test_reverse_requires_posted() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let draft = repo
        .create(simple_entry(date(2026, 4, 12), cash, sales, dec!(10)))
        .await
        .unwrap();
    let err = repo.reverse(draft.id, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotPosted { status: EntryStatus::Draft, .. }));

    let page = repo.list(JournalEntryFilter::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_delete_only_drafts() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    let draft = repo
        .create(simple_entry(date(2026, 4, 12), cash, sales, dec!(10)))
        .await
        .unwrap();
    repo.delete(draft.id).await.unwrap();
    let err = repo.get(draft.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::EntryNotFound(_)));

    let posted = repo
        .create(simple_entry(date(2026, 4, 13), cash, sales, dec!(10)))
        .await
        .unwrap();
    repo.post(posted.id).await.unwrap();
    let err = repo.delete(posted.id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::CanOnlyDeleteDraft { status: EntryStatus::Posted, .. }
    ));
}

#[tokio::test]
async fn test_get_by_reference() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let receivable = account_id(&db, AccountRole::AccountsReceivable).await;

    let payment = EntryReference::new(ReferenceType::Payment, Uuid::new_v4());
    repo.create(simple_entry(date(2026, 4, 1), cash, receivable, dec!(30)).with_reference(payment))
        .await
        .unwrap();
    repo.create(simple_entry(date(2026, 4, 5), cash, receivable, dec!(20)).with_reference(payment))
        .await
        .unwrap();
    repo.create(simple_entry(date(2026, 4, 3), cash, receivable, dec!(99)))
        .await
        .unwrap();

    let found = repo.get_by_reference(payment).await.unwrap();
    let dates: Vec<_> = found.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date(2026, 4, 5), date(2026, 4, 1)]);
    assert!(found.iter().all(|e| e.reference == Some(payment)));

    let other = EntryReference::new(ReferenceType::Payment, Uuid::new_v4());
    assert!(repo.get_by_reference(other).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let db = setup_with_accounts().await;
    let repo = JournalRepository::new(db.clone());
    let cash = account_id(&db, AccountRole::Cash).await;
    let bank = account_id(&db, AccountRole::Bank).await;
    let sales = account_id(&db, AccountRole::SalesRevenue).await;

    for day in 1..=5 {
        let entry = repo
            .create(simple_entry(date(2026, 5, day), cash, sales, dec!(10)))
            .await
            .unwrap();
        if day % 2 == 1 {
            repo.post(entry.id).await.unwrap();
        }
    }
    repo.create(
        simple_entry(date(2026, 5, 6), bank, sales, dec!(10))
            .with_reference(EntryReference::new(ReferenceType::Order, Uuid::new_v4())),
    )
    .await
    .unwrap();

    let all = repo.list(JournalEntryFilter::default()).await.unwrap();
    assert_eq!(all.total, 6);
    assert_eq!(all.data[0].date, date(2026, 5, 6));

    let posted = repo
        .list(JournalEntryFilter {
            status: Some(EntryStatus::Posted),
            ..JournalEntryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(posted.total, 3);

    let bank_only = repo
        .list(JournalEntryFilter {
            account_id: Some(bank),
            ..JournalEntryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(bank_only.total, 1);
    assert_eq!(bank_only.data[0].lines.len(), 2);

    let orders = repo
        .list(JournalEntryFilter {
            reference_type: Some(ReferenceType::Order),
            ..JournalEntryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(orders.total, 1);

    let window = repo
        .list(JournalEntryFilter {
            from_date: Some(date(2026, 5, 2)),
            to_date: Some(date(2026, 5, 4)),
            ..JournalEntryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(window.total, 3);

    let second_page = repo
        .list(JournalEntryFilter {
            account_id: Some(cash),
            page: PageRequest::new(2, 2),
            ..JournalEntryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page.total, 5);
    let dates: Vec<_> = second_page.data.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date(2026, 5, 3), date(2026, 5, 2)]);
}
