//! Business rule validation for journal line sets.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{EntryTotals, JournalLineInput};

/// Largest accepted difference between total debits and credits (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Validates a line set and returns its totals.
///
/// Checks, in order:
/// 1. At least two lines
/// 2. No negative amounts
/// 3. Σdebit == Σcredit within 0.01
/// 4. Every line has exactly one side strictly positive
///
/// # Errors
///
/// Returns the first rule the line set violates.
pub fn validate_lines(lines: &[JournalLineInput]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    for (index, line) in lines.iter().enumerate() {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line: index + 1 });
        }
    }

    let totals = EntryTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)));
    if !totals.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    for (index, line) in lines.iter().enumerate() {
        let has_debit = line.debit > Decimal::ZERO;
        let has_credit = line.credit > Decimal::ZERO;
        if has_debit == has_credit {
            return Err(LedgerError::InvalidLineSides { line: index + 1 });
        }
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn debit(amount: Decimal) -> JournalLineInput {
        JournalLineInput::debit(AccountId::new(), amount)
    }

    fn credit(amount: Decimal) -> JournalLineInput {
        JournalLineInput::credit(AccountId::new(), amount)
    }

    #[test]
    fn test_balanced_lines() {
        let totals = validate_lines(&[debit(dec!(100.00)), credit(dec!(100.00))]).unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.credit, dec!(100.00));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(validate_lines(&[debit(dec!(100.00)), credit(dec!(99.99))]).is_ok());
        assert!(matches!(
            validate_lines(&[debit(dec!(100.00)), credit(dec!(99.98))]),
            Err(LedgerError::Unbalanced { .. })
        ));
    }

    #[test]
    fn test_unbalanced_lines() {
        assert!(matches!(
            validate_lines(&[debit(dec!(100)), credit(dec!(50))]),
            Err(LedgerError::Unbalanced { .. })
        ));
    }

    #[test]
    fn test_insufficient_lines() {
        assert!(matches!(
            validate_lines(&[]),
            Err(LedgerError::InsufficientLines)
        ));
        assert!(matches!(
            validate_lines(&[debit(dec!(10))]),
            Err(LedgerError::InsufficientLines)
        ));
    }

    #[test]
    fn test_line_with_both_sides() {
        let mut both = debit(dec!(50));
        both.credit = dec!(50);
        assert!(matches!(
            validate_lines(&[both, debit(dec!(10)), credit(dec!(10))]),
            Err(LedgerError::InvalidLineSides { line: 1 })
        ));
    }

    #[test]
    fn test_line_with_neither_side() {
        assert!(matches!(
            validate_lines(&[debit(dec!(10)), credit(dec!(10)), debit(Decimal::ZERO)]),
            Err(LedgerError::InvalidLineSides { line: 3 })
        ));
    }

    #[test]
    fn test_negative_amount() {
        assert!(matches!(
            validate_lines(&[debit(dec!(-10)), credit(dec!(-10))]),
            Err(LedgerError::NegativeAmount { line: 1 })
        ));
    }

    #[test]
    fn test_balance_checked_before_sides() {
        let mut both = debit(dec!(50));
        both.credit = dec!(10);
        assert!(matches!(
            validate_lines(&[both, credit(dec!(10))]),
            Err(LedgerError::Unbalanced { .. })
        ));
    }
}
