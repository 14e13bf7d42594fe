//! Property-based tests for journal line validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::JournalLineInput;
use super::validation::{BALANCE_TOLERANCE, validate_lines};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Strategy to split a total into 1..=5 positive parts that sum to it exactly.
fn split_amount() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(1i64..1_000_000i64, 1..=5)
        .prop_map(|parts| parts.into_iter().map(|cents| Decimal::new(cents, 2)).collect())
}

fn debit(amount: Decimal) -> JournalLineInput {
    JournalLineInput::debit(AccountId::new(), amount)
}

fn credit(amount: Decimal) -> JournalLineInput {
    JournalLineInput::credit(AccountId::new(), amount)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Balance rule
    // =========================================================================

    /// Any debit split balanced by a single credit is accepted and totals match.
    #[test]
    fn prop_balanced_split_accepted(parts in split_amount()) {
        let total: Decimal = parts.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> = parts.into_iter().map(debit).collect();
        lines.push(credit(total));

        let totals = validate_lines(&lines);
        prop_assert!(totals.is_ok(), "balanced lines rejected: {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    /// Any difference above the tolerance is rejected.
    #[test]
    fn prop_difference_above_tolerance_rejected(
        amount in positive_amount(),
        extra_cents in 2i64..100_000i64,
    ) {
        let extra = Decimal::new(extra_cents, 2);
        prop_assert!(extra > BALANCE_TOLERANCE);

        let lines = vec![debit(amount + extra), credit(amount)];
        let result = validate_lines(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::Unbalanced { .. })),
            "unbalanced lines accepted: {:?}",
            result
        );
    }

    // =========================================================================
    // Line rules
    // =========================================================================

    /// Negative amounts are rejected regardless of side.
    #[test]
    fn prop_negative_amount_rejected(
        negative in negative_amount(),
        other in positive_amount(),
        on_debit in any::<bool>(),
    ) {
        let lines = if on_debit {
            vec![debit(negative), credit(other)]
        } else {
            vec![debit(other), credit(negative)]
        };
        let result = validate_lines(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::NegativeAmount { .. })),
            "negative amount accepted: {:?}",
            result
        );
    }

    /// A line carrying both sides is rejected even when totals balance.
    #[test]
    fn prop_both_sides_rejected(a in positive_amount(), b in positive_amount()) {
        let mut both = debit(a);
        both.credit = b;
        let lines = vec![both, debit(b), credit(a)];

        let result = validate_lines(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::InvalidLineSides { line: 1 })),
            "two-sided line accepted: {:?}",
            result
        );
    }

    /// Single-line entries are rejected.
    #[test]
    fn prop_single_line_rejected(amount in positive_amount(), on_debit in any::<bool>()) {
        let line = if on_debit { debit(amount) } else { credit(amount) };
        prop_assert!(matches!(
            validate_lines(&[line]),
            Err(LedgerError::InsufficientLines)
        ));
    }
}
