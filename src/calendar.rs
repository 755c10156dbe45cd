//! Holiday and make-up-workday calendar.
//!
//! A fixed registered set of holidays plus the make-up workdays that shift
//! work onto weekends around them (standard practice for CN public-holiday
//! bridging). The calendar itself is dumb and session-static; all
//! memoization happens in [`FactEvaluator`](crate::FactEvaluator).

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::HashSet;

/// Registered holidays and make-up workdays over `NaiveDate`.
///
/// A make-up workday on a Saturday/Sunday counts as a regular working day,
/// and is therefore *not* a weekend for scheduling purposes. That keeps the
/// invariant `workday == !holiday && !weekend` exact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayCalendar {
    /// Dates that are public holidays
    #[serde(default)]
    holidays: HashSet<NaiveDate>,
    /// Weekend dates designated as working days
    #[serde(default)]
    makeup_workdays: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Empty calendar: plain Monday-Friday working weeks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar with the given holiday and make-up-workday sets.
    pub fn with_dates(
        holidays: impl IntoIterator<Item = NaiveDate>,
        makeup_workdays: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            makeup_workdays: makeup_workdays.into_iter().collect(),
        }
    }

    /// Register a holiday.
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// Register a make-up workday.
    pub fn add_makeup_workday(&mut self, date: NaiveDate) {
        self.makeup_workdays.insert(date);
    }

    /// True iff `date` is a registered holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// True iff `date` is a weekend designated as a working day.
    pub fn is_makeup_workday(&self, date: NaiveDate) -> bool {
        self.makeup_workdays.contains(&date)
    }

    /// Weekend for scheduling purposes: Saturday/Sunday unless designated a
    /// make-up workday.
    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_makeup_workday(date)
    }

    /// A day people work on: neither a holiday nor a (non-make-up) weekend.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.is_holiday(date) && !self.is_weekend(date)
    }

    /// Number of registered holidays.
    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}
