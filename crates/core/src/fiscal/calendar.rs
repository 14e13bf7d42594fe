//! Fiscal calendar rules: date ranges, overlap, and close/reopen transitions.

use chrono::NaiveDate;
use tally_shared::types::FiscalPeriodId;

use super::error::FiscalError;
use super::period::{FiscalPeriod, FiscalPeriodStatus, UpdateFiscalPeriodInput};

/// Validates that a period's end date is strictly after its start date.
///
/// # Errors
///
/// Returns `InvalidDateRange` if `end <= start`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FiscalError> {
    if end <= start {
        return Err(FiscalError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if:
/// a_start <= b_end AND a_end >= b_start
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Stateless service for fiscal calendar rules.
pub struct FiscalCalendar;

impl FiscalCalendar {
    /// Validates a new period against the existing calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the dates are out of order, or the
    /// range intersects an existing period.
    pub fn validate_new_period(
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        existing: &[FiscalPeriod],
    ) -> Result<(), FiscalError> {
        if name.trim().is_empty() {
            return Err(FiscalError::EmptyName);
        }
        validate_date_range(start, end)?;
        Self::check_no_overlap(start, end, existing, None)
    }

    /// Validates a patch and returns the resulting `(start, end)` range.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is closed, the name is blank, or new dates
    /// are out of order or overlap another period.
    pub fn validate_update(
        period: &FiscalPeriod,
        patch: &UpdateFiscalPeriodInput,
        existing: &[FiscalPeriod],
    ) -> Result<(NaiveDate, NaiveDate), FiscalError> {
        if period.status == FiscalPeriodStatus::Closed {
            return Err(FiscalError::PeriodClosed(period.name.clone()));
        }
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(FiscalError::EmptyName);
        }

        let start = patch.start_date.unwrap_or(period.start_date);
        let end = patch.end_date.unwrap_or(period.end_date);
        if patch.changes_dates() {
            validate_date_range(start, end)?;
            Self::check_no_overlap(start, end, existing, Some(period.id))?;
        }
        Ok((start, end))
    }

    /// Rejects a range that intersects any period other than `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `Overlap` naming the first conflicting period.
    pub fn check_no_overlap(
        start: NaiveDate,
        end: NaiveDate,
        existing: &[FiscalPeriod],
        exclude: Option<FiscalPeriodId>,
    ) -> Result<(), FiscalError> {
        let conflict = existing
            .iter()
            .filter(|p| Some(p.id) != exclude)
            .find(|p| date_ranges_overlap(start, end, p.start_date, p.end_date));

        match conflict {
            Some(p) => Err(FiscalError::Overlap(p.name.clone())),
            None => Ok(()),
        }
    }

    /// Validates the OPEN -> CLOSED transition.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the period is already closed or still has drafts.
    pub fn validate_close(period: &FiscalPeriod, draft_count: u64) -> Result<(), FiscalError> {
        if period.status == FiscalPeriodStatus::Closed {
            return Err(FiscalError::AlreadyClosed(period.name.clone()));
        }
        if draft_count > 0 {
            return Err(FiscalError::HasDraftEntries {
                name: period.name.clone(),
                draft_count,
            });
        }
        Ok(())
    }

    /// Validates the CLOSED -> OPEN transition.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyOpen` if the period is open.
    pub fn validate_reopen(period: &FiscalPeriod) -> Result<(), FiscalError> {
        if period.status == FiscalPeriodStatus::Open {
            return Err(FiscalError::AlreadyOpen(period.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(name: &str, start: NaiveDate, end: NaiveDate) -> FiscalPeriod {
        FiscalPeriod {
            id: FiscalPeriodId::new(),
            name: name.to_string(),
            start_date: start,
            end_date: end,
            status: FiscalPeriodStatus::Open,
            closed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn january() -> FiscalPeriod {
        period("January 2026", date(2026, 1, 1), date(2026, 1, 31))
    }

    #[test]
    fn test_date_range_must_be_increasing() {
        assert!(validate_date_range(date(2026, 1, 1), date(2026, 1, 31)).is_ok());
        assert!(validate_date_range(date(2026, 1, 1), date(2026, 1, 1)).is_err());
        assert!(validate_date_range(date(2026, 2, 1), date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_new_period_adjacent_is_allowed() {
        let existing = vec![january()];
        assert!(
            FiscalCalendar::validate_new_period(
                "February 2026",
                date(2026, 2, 1),
                date(2026, 2, 28),
                &existing
            )
            .is_ok()
        );
    }

    #[test]
    fn test_new_period_sharing_boundary_day_overlaps() {
        let existing = vec![january()];
        let result = FiscalCalendar::validate_new_period(
            "Late January",
            date(2026, 1, 31),
            date(2026, 2, 15),
            &existing,
        );
        assert!(matches!(result, Err(FiscalError::Overlap(name)) if name == "January 2026"));
    }

    #[test]
    fn test_update_excludes_self_from_overlap() {
        let jan = january();
        let existing = vec![jan.clone()];
        let patch = UpdateFiscalPeriodInput {
            end_date: Some(date(2026, 1, 30)),
            ..Default::default()
        };
        let (start, end) = FiscalCalendar::validate_update(&jan, &patch, &existing).unwrap();
        assert_eq!(start, date(2026, 1, 1));
        assert_eq!(end, date(2026, 1, 30));
    }

    #[test]
    fn test_update_closed_period_rejected() {
        let mut jan = january();
        jan.status = FiscalPeriodStatus::Closed;
        let patch = UpdateFiscalPeriodInput {
            name: Some("Jan".into()),
            ..Default::default()
        };
        assert!(matches!(
            FiscalCalendar::validate_update(&jan, &patch, &[]),
            Err(FiscalError::PeriodClosed(_))
        ));
    }

    #[test]
    fn test_close_and_reopen_transitions() {
        let mut jan = january();
        assert!(matches!(
            FiscalCalendar::validate_close(&jan, 1),
            Err(FiscalError::HasDraftEntries { draft_count: 1, .. })
        ));
        assert!(FiscalCalendar::validate_close(&jan, 0).is_ok());
        assert!(matches!(
            FiscalCalendar::validate_reopen(&jan),
            Err(FiscalError::AlreadyOpen(_))
        ));

        jan.status = FiscalPeriodStatus::Closed;
        assert!(matches!(
            FiscalCalendar::validate_close(&jan, 0),
            Err(FiscalError::AlreadyClosed(_))
        ));
        assert!(FiscalCalendar::validate_reopen(&jan).is_ok());
    }

    // ========================================================================
    // Overlap detection is symmetric
    // ========================================================================

    fn range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
        (0i64..365, 1i64..60).prop_map(|(offset, len)| {
            let start = date(2026, 1, 1) + chrono::Duration::days(offset);
            (start, start + chrono::Duration::days(len))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Overlap does not depend on which range is the existing one.
        #[test]
        fn prop_overlap_is_symmetric(a in range(), b in range()) {
            prop_assert_eq!(
                date_ranges_overlap(a.0, a.1, b.0, b.1),
                date_ranges_overlap(b.0, b.1, a.0, a.1)
            );
        }

        /// Creating a period fails exactly when it shares at least one day with an existing one.
        #[test]
        fn prop_create_rejects_any_shared_day(a in range(), b in range()) {
            let existing = vec![period("existing", a.0, a.1)];
            let shares_day = a.0.iter_days()
                .take_while(|d| *d <= a.1)
                .any(|d| d >= b.0 && d <= b.1);
            let result = FiscalCalendar::validate_new_period("new", b.0, b.1, &existing);
            prop_assert_eq!(result.is_err(), shares_day);
        }
    }
}
