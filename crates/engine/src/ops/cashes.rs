use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Cash, MoneyCents, MonthWindow, ResultEngine, cashes};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Record a cash row: an income event or a current-money snapshot.
    ///
    /// `reference_date` defaults to the start of the month containing now,
    /// matching the window a caller without an explicit month is working in.
    pub async fn record_cash(
        &self,
        ledger_id: &str,
        name: Option<&str>,
        value: MoneyCents,
        reference_date: Option<DateTime<Utc>>,
        is_income: bool,
        username: &str,
    ) -> ResultEngine<Uuid> {
        let now = Utc::now();
        let reference_date = match reference_date {
            Some(ts) => ts,
            None => MonthWindow::current(self.timezone, now)?.start,
        };
        let cash = Cash::new(
            normalize_optional_text(name),
            value,
            now,
            reference_date,
            is_income,
            ledger_id.to_string(),
        );
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;
            cashes::ActiveModel::from(&cash).insert(&db_tx).await?;
            Ok(cash.id)
        })
    }

    /// Update a cash row's value and/or reference date.
    ///
    /// `recorded_at` is bumped on every save, which is what breaks ties
    /// between snapshots sharing a `reference_date`.
    pub async fn update_cash(
        &self,
        cash_id: Uuid,
        value: Option<MoneyCents>,
        reference_date: Option<DateTime<Utc>>,
        username: &str,
    ) -> ResultEngine<()> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let model = self.require_cash(&db_tx, cash_id, username).await?;

            let mut active = cashes::ActiveModel {
                id: ActiveValue::Set(model.id),
                recorded_at: ActiveValue::Set(now),
                ..Default::default()
            };
            if let Some(value) = value {
                active.value_cents = ActiveValue::Set(value.cents());
            }
            if let Some(reference_date) = reference_date {
                active.reference_date = ActiveValue::Set(reference_date);
            }
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a cash row.
    pub async fn delete_cash(&self, cash_id: Uuid, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_cash(&db_tx, cash_id, username).await?;
            cashes::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Cash rows of a ledger, newest reference date first.
    ///
    /// `window` restricts to one month; `is_income` restricts to income events
    /// or snapshots.
    pub async fn list_cashes(
        &self,
        ledger_id: &str,
        window: Option<&MonthWindow>,
        is_income: Option<bool>,
        username: &str,
    ) -> ResultEngine<Vec<Cash>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;

            let mut query = cashes::Entity::find()
                .filter(cashes::Column::LedgerId.eq(ledger_id.to_string()))
                .order_by_desc(cashes::Column::ReferenceDate)
                .order_by_desc(cashes::Column::RecordedAt);
            if let Some(window) = window {
                query = query
                    .filter(cashes::Column::ReferenceDate.gte(window.start))
                    .filter(cashes::Column::ReferenceDate.lt(window.end));
            }
            if let Some(is_income) = is_income {
                query = query.filter(cashes::Column::IsIncome.eq(is_income));
            }

            let models = query.all(&db_tx).await?;
            models.into_iter().map(Cash::try_from).collect()
        })
    }
}
