//! Fiscal period calendar.
//!
//! Periods are non-overlapping, inclusive date ranges that are either OPEN or
//! CLOSED. Journal entries are stamped with the period covering their date and
//! cannot be posted into a CLOSED period.

pub mod calendar;
pub mod error;
pub mod period;

pub use calendar::FiscalCalendar;
pub use error::FiscalError;
pub use period::{
    CreateFiscalPeriodInput, FiscalPeriod, FiscalPeriodStatus, UpdateFiscalPeriodInput,
};
