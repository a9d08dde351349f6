//! Snapshot resolution: which cash row answers "how much money was there?"
//! for a given month, plus the carry-forward synthesis for months without one.

use chrono::{DateTime, Months, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{Cash, MoneyCents, MonthWindow, ResultEngine, cashes, expenditures};

use super::Engine;

impl Engine {
    /// Latest snapshot (`is_income = false`) whose `reference_date` falls in
    /// the window, ordered by `reference_date` then `recorded_at`.
    pub(super) async fn snapshot_in_window(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        window: &MonthWindow,
    ) -> ResultEngine<Option<cashes::Model>> {
        cashes::Entity::find()
            .filter(cashes::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(cashes::Column::IsIncome.eq(false))
            .filter(cashes::Column::ReferenceDate.gte(window.start))
            .filter(cashes::Column::ReferenceDate.lt(window.end))
            .order_by_desc(cashes::Column::ReferenceDate)
            .order_by_desc(cashes::Column::RecordedAt)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Latest snapshot strictly before `before`, with unbounded look-back.
    pub(super) async fn snapshot_before(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        before: DateTime<Utc>,
    ) -> ResultEngine<Option<cashes::Model>> {
        cashes::Entity::find()
            .filter(cashes::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(cashes::Column::IsIncome.eq(false))
            .filter(cashes::Column::ReferenceDate.lt(before))
            .order_by_desc(cashes::Column::ReferenceDate)
            .order_by_desc(cashes::Column::RecordedAt)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// A precedent snapshot is fresh when advancing its `reference_date` by
    /// one calendar month (in the engine's timezone) still reaches the actual
    /// snapshot's `reference_date`.
    pub(super) fn precedent_is_fresh(
        &self,
        actual: &cashes::Model,
        precedent: &cashes::Model,
    ) -> bool {
        precedent
            .reference_date
            .with_timezone(&self.timezone)
            .checked_add_months(Months::new(1))
            .is_some_and(|limit| limit.with_timezone(&Utc) >= actual.reference_date)
    }

    /// Get-or-create the snapshot for a month, valued at the most recent
    /// prior snapshot (or 0). Runs inside the caller's transaction, which is
    /// what keeps concurrent report calls from double-inserting.
    pub(super) async fn ensure_month_snapshot(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        window: &MonthWindow,
    ) -> ResultEngine<cashes::Model> {
        if let Some(model) = self.snapshot_in_window(db, ledger_id, window).await? {
            return Ok(model);
        }

        let carried = self
            .snapshot_before(db, ledger_id, window.start)
            .await?
            .map(|model| model.value_cents)
            .unwrap_or(0);
        tracing::info!(
            ledger_id,
            month = %window.spec(),
            value_cents = carried,
            "synthesizing carry-forward snapshot"
        );

        let cash = Cash::new(
            None,
            MoneyCents::new(carried),
            Utc::now(),
            window.start,
            false,
            ledger_id.to_string(),
        );
        let model = cashes::ActiveModel::from(&cash).insert(db).await?;
        Ok(model)
    }

    /// Sum of cash values for a flag within a window, in cents.
    pub(super) async fn sum_cashes(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        window: &MonthWindow,
        is_income: bool,
    ) -> ResultEngine<i64> {
        let sum: Option<Option<i64>> = cashes::Entity::find()
            .select_only()
            .column_as(cashes::Column::ValueCents.sum(), "sum")
            .filter(cashes::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(cashes::Column::IsIncome.eq(is_income))
            .filter(cashes::Column::ReferenceDate.gte(window.start))
            .filter(cashes::Column::ReferenceDate.lt(window.end))
            .into_tuple()
            .one(db)
            .await?;
        Ok(sum.flatten().unwrap_or(0))
    }

    /// Sum of expenditure values for a flag within a window, in cents.
    pub(super) async fn sum_expenditures(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        window: &MonthWindow,
        is_expected: bool,
    ) -> ResultEngine<i64> {
        let sum: Option<Option<i64>> = expenditures::Entity::find()
            .select_only()
            .column_as(expenditures::Column::ValueCents.sum(), "sum")
            .filter(expenditures::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(expenditures::Column::IsExpected.eq(is_expected))
            .filter(expenditures::Column::Date.gte(window.start))
            .filter(expenditures::Column::Date.lt(window.end))
            .into_tuple()
            .one(db)
            .await?;
        Ok(sum.flatten().unwrap_or(0))
    }
}
