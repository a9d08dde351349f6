//! Computed report types.
//!
//! Warnings are data, not errors: a computation that hits a missing snapshot
//! still produces every field using the documented `0`/`None` fallbacks, and
//! annotates the record with one of the warning strings below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

pub const WARN_NO_ACTUAL_MONEY: &str = "Actual money for current month not registered yet";
pub const WARN_NO_PRECEDENT_MONEY: &str = "Previous month money not found";
pub const WARN_STALE_PRECEDENT: &str = "Previous money registration is more than a month ago";
pub const WARN_MONTH_WITHOUT_SNAPSHOT: &str = "This month has no actual money registration";

/// The expected/actual/delta view of one expenditure.
///
/// - expected line: `actual` sums the actuals linked to it, `expected` is its
///   own value.
/// - actual linked to an expected line: `actual` sums every actual sharing the
///   link, `expected` is the linked value.
/// - standalone actual: `actual` is its own value, `expected` and `delta` are
///   `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureProspect {
    pub actual: MoneyCents,
    pub expected: Option<MoneyCents>,
    pub delta: Option<MoneyCents>,
}

/// The monthly income/expenditure/saving summary of one ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prospect {
    pub income: MoneyCents,
    /// Latest snapshot value in the window, `0` when none exists.
    pub actual_money: MoneyCents,
    pub expected_expenditure: MoneyCents,
    pub actual_expenditure: MoneyCents,
    pub delta_expenditure: MoneyCents,
    pub expected_saving: MoneyCents,
    /// `None` when the window has no snapshot.
    pub actual_saving: Option<MoneyCents>,
    pub delta_saving: Option<MoneyCents>,
    pub warn: Option<String>,
}

/// One month of the multi-month report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReportEntry {
    /// `"MM-YYYY"` label.
    pub month: String,
    /// True for the month of the requesting window.
    pub is_working: bool,
    pub income: MoneyCents,
    /// Snapshot value for the month, carried forward from the most recent
    /// prior snapshot when the month has none.
    pub current_money: MoneyCents,
    pub previous_month_actual_money: MoneyCents,
    /// Spend implied by the cash-flow delta, not a sum of expenditure rows.
    pub expenditure: MoneyCents,
    pub warn: Option<String>,
}

/// Earliest and latest month-start with any ledger activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBoundaries {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    /// Reverse-chronological, one entry per month with activity.
    pub months: Vec<MonthlyReportEntry>,
    pub boundaries: TimeBoundaries,
}
