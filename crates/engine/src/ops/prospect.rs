use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    MoneyCents, MonthWindow, Prospect, ResultEngine, WARN_NO_ACTUAL_MONEY,
    WARN_NO_PRECEDENT_MONEY, WARN_STALE_PRECEDENT,
};

use super::{Engine, with_tx};

impl Engine {
    /// The monthly income/expenditure/saving summary of a ledger.
    ///
    /// Warning precedence: a window without a snapshot wins over a missing
    /// precedent, which wins over a stale precedent. Warnings never abort the
    /// computation; every other field still comes out with its `0`/`None`
    /// fallback.
    pub async fn monthly_prospect(
        &self,
        ledger_id: &str,
        window: &MonthWindow,
        username: &str,
    ) -> ResultEngine<Prospect> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;
            if self.carry_forward {
                self.ensure_month_snapshot(&db_tx, ledger_id, window).await?;
            }
            self.compute_prospect(&db_tx, ledger_id, window).await
        })
    }

    pub(super) async fn compute_prospect(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        window: &MonthWindow,
    ) -> ResultEngine<Prospect> {
        let actual_money = self.snapshot_in_window(db, ledger_id, window).await?;
        let precedent = self.snapshot_before(db, ledger_id, window.start).await?;

        let income = MoneyCents::new(self.sum_cashes(db, ledger_id, window, true).await?);
        let expected_expenditure =
            MoneyCents::new(self.sum_expenditures(db, ledger_id, window, true).await?);
        let actual_expenditure =
            MoneyCents::new(self.sum_expenditures(db, ledger_id, window, false).await?);

        let warn = match (&actual_money, &precedent) {
            (None, _) => Some(WARN_NO_ACTUAL_MONEY.to_string()),
            (Some(_), None) => Some(WARN_NO_PRECEDENT_MONEY.to_string()),
            (Some(actual), Some(precedent)) => (!self.precedent_is_fresh(actual, precedent))
                .then(|| WARN_STALE_PRECEDENT.to_string()),
        };

        let expected_saving = income - actual_expenditure;
        let (actual_saving, delta_saving) = match &actual_money {
            None => (None, None),
            Some(snapshot) => {
                let precedent_value = precedent.as_ref().map_or(0, |model| model.value_cents);
                let actual_saving = MoneyCents::new(snapshot.value_cents - precedent_value);
                (Some(actual_saving), Some(actual_saving - expected_saving))
            }
        };

        Ok(Prospect {
            income,
            actual_money: MoneyCents::new(
                actual_money.as_ref().map_or(0, |model| model.value_cents),
            ),
            expected_expenditure,
            actual_expenditure,
            delta_expenditure: expected_expenditure - actual_expenditure,
            expected_saving,
            actual_saving,
            delta_saving,
            warn,
        })
    }
}
