//! Property-based tests for the journal state machine and reversal.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId, JournalLineId};

use super::error::LedgerError;
use super::reversal::ReversalService;
use super::service::LedgerService;
use super::types::{EntryStatus, JournalEntry, JournalLine};
use super::validation::validate_lines;

/// Strategy to generate a balanced posted entry with 2..=6 lines.
fn posted_entry() -> impl Strategy<Value = JournalEntry> {
    prop::collection::vec((1i64..1_000_000i64, any::<bool>()), 1..=5).prop_map(|parts| {
        let mut lines = Vec::new();
        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        for (cents, is_debit) in parts {
            let amount = Decimal::new(cents, 2);
            let (debit, credit) = if is_debit {
                debit_total += amount;
                (amount, Decimal::ZERO)
            } else {
                credit_total += amount;
                (Decimal::ZERO, amount)
            };
            lines.push((debit, credit));
        }
        let balancing = debit_total - credit_total;
        if balancing > Decimal::ZERO {
            lines.push((Decimal::ZERO, balancing));
        } else if balancing < Decimal::ZERO {
            lines.push((-balancing, Decimal::ZERO));
        } else {
            lines.push((Decimal::ONE, Decimal::ZERO));
            lines.push((Decimal::ZERO, Decimal::ONE));
        }

        JournalEntry {
            id: JournalEntryId::new(),
            entry_number: "JE-20261001-00000001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            description: "generated".to_string(),
            reference: None,
            status: EntryStatus::Posted,
            fiscal_period_id: None,
            posted_at: Some(Utc::now()),
            reversed_entry_id: None,
            created_by: None,
            source_rule: None,
            lines: lines
                .into_iter()
                .zip(1..)
                .map(|((debit, credit), line_number)| JournalLine {
                    id: JournalLineId::new(),
                    account_id: AccountId::new(),
                    debit,
                    credit,
                    memo: None,
                    line_number,
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    })
}

fn status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Draft),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Reversed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Reversal mirrors the original
    // =========================================================================

    /// The reversal of any posted entry is itself a valid balanced line set,
    /// with each line's sides swapped.
    #[test]
    fn prop_reversal_is_valid_mirror(entry in posted_entry()) {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let reversal = ReversalService::build_reversal(&entry, today, None);

        let totals = validate_lines(&reversal.lines);
        prop_assert!(totals.is_ok(), "reversal rejected: {:?}", totals);
        let totals = totals.unwrap();
        let original = entry.totals();
        prop_assert_eq!(totals.debit, original.credit);
        prop_assert_eq!(totals.credit, original.debit);

        for (mirrored, line) in reversal.lines.iter().zip(&entry.lines) {
            prop_assert_eq!(mirrored.account_id, line.account_id);
            prop_assert_eq!(mirrored.debit, line.credit);
            prop_assert_eq!(mirrored.credit, line.debit);
        }
    }

    /// Original plus reversal nets every account to zero.
    #[test]
    fn prop_reversal_nets_to_zero(entry in posted_entry()) {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let reversal = ReversalService::build_reversal(&entry, today, None);
        for (mirrored, line) in reversal.lines.iter().zip(&entry.lines) {
            prop_assert_eq!(
                (line.debit - line.credit) + (mirrored.debit - mirrored.credit),
                Decimal::ZERO
            );
        }
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Exactly one of post/reverse/delete is allowed from each status
    /// (none from REVERSED).
    #[test]
    fn prop_transitions_follow_state_machine(mut entry in posted_entry(), status in status()) {
        entry.status = status;
        let can_post = LedgerService::ensure_can_post(&entry, None).is_ok();
        let can_reverse = LedgerService::ensure_can_reverse(&entry).is_ok();
        let can_delete = LedgerService::ensure_can_delete(&entry).is_ok();

        match status {
            EntryStatus::Draft => prop_assert!(can_post && !can_reverse && can_delete),
            EntryStatus::Posted => prop_assert!(!can_post && can_reverse && !can_delete),
            EntryStatus::Reversed => prop_assert!(!can_post && !can_reverse && !can_delete),
        }
    }

    /// Posting twice is always a conflict.
    #[test]
    fn prop_second_post_conflicts(mut entry in posted_entry()) {
        entry.status = EntryStatus::Draft;
        prop_assert!(LedgerService::ensure_can_post(&entry, None).is_ok());
        entry.status = EntryStatus::Posted;
        prop_assert!(matches!(
            LedgerService::ensure_can_post(&entry, None),
            Err(LedgerError::AlreadyPosted(_))
        ));
    }
}
