//! Calendar month windows.
//!
//! All monthly aggregations run over a half-open window `[start, end)` where
//! `end` is `start` advanced by exactly one calendar month. Boundaries are
//! computed in the engine's configured timezone and stored as UTC instants.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{EngineError, ResultEngine};

/// Parses a `"MM-YYYY"` month specifier.
///
/// Returns `(month, year)` with `1 <= month <= 12`, or `None` when the input
/// is malformed.
pub fn parse_month_spec(spec: &str) -> Option<(u32, i32)> {
    let (month, year) = spec.trim().split_once('-')?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, year))
}

/// One calendar month as a half-open UTC interval `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthWindow {
    pub month: u32,
    pub year: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Builds the window for a given month and year.
    ///
    /// `end` is computed with calendar arithmetic (Jan 31 days, Feb 28/29, and
    /// Dec rolls into January of the next year). Local midnights are resolved
    /// with `earliest()` so DST transitions cannot make a boundary ambiguous.
    pub fn of(tz: Tz, month: u32, year: i32) -> ResultEngine<Self> {
        let invalid = || EngineError::InvalidMonth(format!("{month:02}-{year}"));

        let start_naive = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        let end_naive = start_naive
            .checked_add_months(Months::new(1))
            .ok_or_else(invalid)?;

        let start = tz
            .from_local_datetime(&start_naive)
            .earliest()
            .ok_or_else(invalid)?;
        let end = tz
            .from_local_datetime(&end_naive)
            .earliest()
            .ok_or_else(invalid)?;

        Ok(Self {
            month,
            year,
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

    /// Window of the month containing `now`.
    pub fn current(tz: Tz, now: DateTime<Utc>) -> ResultEngine<Self> {
        let local = now.with_timezone(&tz);
        Self::of(tz, local.month(), local.year())
    }

    /// Resolves an optional `"MM-YYYY"` specifier.
    ///
    /// A malformed explicit specifier is an error; a missing one falls back to
    /// the month containing `now`.
    pub fn resolve(tz: Tz, spec: Option<&str>, now: DateTime<Utc>) -> ResultEngine<Self> {
        match spec {
            Some(raw) => {
                let (month, year) = parse_month_spec(raw)
                    .ok_or_else(|| EngineError::InvalidMonth(raw.to_string()))?;
                Self::of(tz, month, year)
            }
            None => Self::current(tz, now),
        }
    }

    /// Window of the month right before this one.
    pub fn precedent(&self, tz: Tz) -> ResultEngine<Self> {
        let (month, year) = if self.month == 1 {
            (12, self.year - 1)
        } else {
            (self.month - 1, self.year)
        };
        Self::of(tz, month, year)
    }

    /// The `"MM-YYYY"` label of this window.
    #[must_use]
    pub fn spec(&self) -> String {
        format!("{:02}-{}", self.month, self.year)
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handles_valid_and_invalid_specs() {
        assert_eq!(parse_month_spec("04-2023"), Some((4, 2023)));
        assert_eq!(parse_month_spec("4-2023"), Some((4, 2023)));
        assert_eq!(parse_month_spec(" 12-1999 "), Some((12, 1999)));
        assert_eq!(parse_month_spec("13-2023"), None);
        assert_eq!(parse_month_spec("0-2023"), None);
        assert_eq!(parse_month_spec("2023-04-01"), None);
        assert_eq!(parse_month_spec("april"), None);
        assert_eq!(parse_month_spec(""), None);
    }

    #[test]
    fn window_spans_one_calendar_month() {
        let window = MonthWindow::of(chrono_tz::UTC, 1, 2023).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap());

        let window = MonthWindow::of(chrono_tz::UTC, 12, 2023).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        // Leap February.
        let window = MonthWindow::of(chrono_tz::UTC, 2, 2024).unwrap();
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_boundaries_follow_the_timezone() {
        // Rome is UTC+2 in April (DST), UTC+1 in March.
        let window = MonthWindow::of(chrono_tz::Europe::Rome, 4, 2023).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2023, 3, 31, 22, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2023, 4, 30, 22, 0, 0).unwrap());
    }

    #[test]
    fn contains_is_half_open() {
        let window = MonthWindow::of(chrono_tz::UTC, 4, 2023).unwrap();
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn resolve_defaults_to_the_current_month() {
        let now = Utc.with_ymd_and_hms(2023, 4, 15, 10, 30, 0).unwrap();
        let window = MonthWindow::resolve(chrono_tz::UTC, None, now).unwrap();
        assert_eq!((window.month, window.year), (4, 2023));

        let window = MonthWindow::resolve(chrono_tz::UTC, Some("02-2021"), now).unwrap();
        assert_eq!((window.month, window.year), (2, 2021));

        assert_eq!(
            MonthWindow::resolve(chrono_tz::UTC, Some("garbage"), now),
            Err(EngineError::InvalidMonth("garbage".to_string()))
        );
    }

    #[test]
    fn precedent_rolls_over_january() {
        let window = MonthWindow::of(chrono_tz::UTC, 1, 2023).unwrap();
        let precedent = window.precedent(chrono_tz::UTC).unwrap();
        assert_eq!((precedent.month, precedent.year), (12, 2022));
        assert_eq!(precedent.end, window.start);
    }

    #[test]
    fn spec_round_trips() {
        let window = MonthWindow::of(chrono_tz::UTC, 4, 2023).unwrap();
        assert_eq!(window.spec(), "04-2023");
        assert_eq!(parse_month_spec(&window.spec()), Some((4, 2023)));
    }
}
