use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    MoneyCents, MonthlyReport, MonthlyReportEntry, MonthWindow, ResultEngine, TimeBoundaries,
    WARN_MONTH_WITHOUT_SNAPSHOT, cashes, expenditures,
};

use super::{Engine, with_tx};

impl Engine {
    /// Reverse-chronological per-month summaries of a ledger's whole history.
    ///
    /// One entry per calendar month with any cash or expenditure activity; the
    /// requesting window's month is always included and flagged `is_working`.
    /// Months without a snapshot report the carried-forward precedent value
    /// (persisting it only when the engine is built with carry-forward on).
    pub async fn monthly_report(
        &self,
        ledger_id: &str,
        window: &MonthWindow,
        username: &str,
    ) -> ResultEngine<MonthlyReport> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;

            let cash_dates: Vec<DateTime<Utc>> = cashes::Entity::find()
                .select_only()
                .column(cashes::Column::ReferenceDate)
                .filter(cashes::Column::LedgerId.eq(ledger_id.to_string()))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let expenditure_dates: Vec<DateTime<Utc>> = expenditures::Entity::find()
                .select_only()
                .column(expenditures::Column::Date)
                .filter(expenditures::Column::LedgerId.eq(ledger_id.to_string()))
                .into_tuple()
                .all(&db_tx)
                .await?;

            // Distinct (year, month) pairs, truncated in the engine's timezone.
            let mut months: BTreeSet<(i32, u32)> = BTreeSet::new();
            for ts in cash_dates.iter().chain(expenditure_dates.iter()) {
                let local = ts.with_timezone(&self.timezone);
                months.insert((local.year(), local.month()));
            }
            months.insert((window.year, window.month));

            let mut entries = Vec::with_capacity(months.len());
            let mut starts = Vec::with_capacity(months.len());
            for (year, month) in months.iter().rev() {
                let month_window = MonthWindow::of(self.timezone, *month, *year)?;

                let income =
                    MoneyCents::new(self.sum_cashes(&db_tx, ledger_id, &month_window, true).await?);
                let snapshot = self
                    .snapshot_in_window(&db_tx, ledger_id, &month_window)
                    .await?;
                let previous = self
                    .snapshot_before(&db_tx, ledger_id, month_window.start)
                    .await?;
                let previous_value =
                    MoneyCents::new(previous.as_ref().map_or(0, |model| model.value_cents));

                // The carried value is reported either way; the flag only
                // decides whether a synthesized row is persisted.
                let current_money = match &snapshot {
                    Some(model) => MoneyCents::new(model.value_cents),
                    None => previous_value,
                };
                let warn = snapshot
                    .is_none()
                    .then(|| WARN_MONTH_WITHOUT_SNAPSHOT.to_string());
                if snapshot.is_none() && self.carry_forward {
                    self.ensure_month_snapshot(&db_tx, ledger_id, &month_window)
                        .await?;
                }

                entries.push(MonthlyReportEntry {
                    month: month_window.spec(),
                    is_working: (*year, *month) == (window.year, window.month),
                    income,
                    current_money,
                    previous_month_actual_money: previous_value,
                    expenditure: current_money - previous_value - income,
                    warn,
                });
                starts.push(month_window.start);
            }

            // `months` is never empty: the requesting window is always in it.
            let boundaries = TimeBoundaries {
                start: starts.iter().min().copied().unwrap_or(window.start),
                end: starts.iter().max().copied().unwrap_or(window.start),
            };

            Ok(MonthlyReport {
                months: entries,
                boundaries,
            })
        })
    }
}
