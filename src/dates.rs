//! Calendar windows for history queries
//!
//! A history query walks every day of a window and derives the keys for
//! that day. [`DateRange`] is the lazy walk; [`date_range`] anchors it to
//! today (local time) each time it is called.

use chrono::{Duration, Local, NaiveDate};

/// Length of the default history window, in calendar days
pub const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Inclusive, ascending run of calendar days
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    /// Every day from `start` through `end`, both included
    ///
    /// Empty when `start` is after `end`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }

    /// The `days` calendar days ending on `end`
    pub fn ending_on(end: NaiveDate, days: i64) -> Self {
        if days <= 0 {
            return Self { next: None, end };
        }
        Self::between(end - Duration::days(days - 1), end)
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self
            .next
            .map(|d| (self.end - d).num_days() as usize + 1)
            .unwrap_or(0);
        (n, Some(n))
    }
}

impl ExactSizeIterator for DateRange {}

/// Current calendar date in the host's local timezone
///
/// Bucket keys are local dates, so every writer sharing a store should run
/// with the same `TZ`.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Days from `since` through today
///
/// Without `since`, the [`DEFAULT_WINDOW_DAYS`] days ending today. Today is
/// read on every call, so a range built tomorrow covers tomorrow.
pub fn date_range(since: Option<NaiveDate>) -> DateRange {
    let end = today();
    match since {
        Some(start) => DateRange::between(start, end),
        None => DateRange::ending_on(end, DEFAULT_WINDOW_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window_is_one_year() {
        let dates: Vec<NaiveDate> = date_range(None).collect();

        assert_eq!(dates.len(), 365);
        assert_eq!(*dates.last().unwrap(), today());
        assert!(dates.windows(2).all(|w| w[1] == w[0] + Duration::days(1)));
    }

    #[test]
    fn test_since_is_included() {
        let since = ymd(2012, 12, 25);
        let dates: Vec<NaiveDate> = date_range(Some(since)).collect();

        assert_eq!(dates[0], since);
        assert!(dates.len() > 1);
        assert_eq!(*dates.last().unwrap(), today());
    }

    #[test]
    fn test_between_inclusive_and_restartable() {
        let range = DateRange::between(ymd(2012, 2, 27), ymd(2012, 3, 1));
        assert_eq!(range.len(), 4);

        let first: Vec<NaiveDate> = range.clone().collect();
        let second: Vec<NaiveDate> = range.collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![ymd(2012, 2, 27), ymd(2012, 2, 28), ymd(2012, 2, 29), ymd(2012, 3, 1)]
        );
    }

    #[test]
    fn test_empty_ranges() {
        assert_eq!(DateRange::between(ymd(2013, 1, 2), ymd(2013, 1, 1)).count(), 0);
        assert_eq!(DateRange::ending_on(ymd(2013, 1, 1), 0).count(), 0);

        let future = today() + Duration::days(3);
        assert_eq!(date_range(Some(future)).count(), 0);
    }

    #[test]
    fn test_today_is_local_date() {
        let before = Local::now().date_naive();
        let d = today();
        let after = Local::now().date_naive();
        assert!(d == before || d == after);
    }

    #[test]
    fn test_single_day() {
        let d = ymd(2013, 1, 1);
        let dates: Vec<NaiveDate> = DateRange::between(d, d).collect();
        assert_eq!(dates, vec![d]);
    }
}
