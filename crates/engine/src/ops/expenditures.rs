use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Expenditure, ExpenditureProspect, MoneyCents, MonthWindow, ResultEngine,
    expenditures,
};

use super::{Engine, normalize_required_name, with_tx};

/// Input for [`Engine::new_expenditure`].
#[derive(Clone, Debug)]
pub struct NewExpenditure {
    pub name: String,
    pub value: MoneyCents,
    pub category_id: Uuid,
    /// Defaults to now when omitted.
    pub date: Option<DateTime<Utc>>,
    pub is_expected: bool,
    pub expected_expenditure_id: Option<Uuid>,
}

/// Patch for [`Engine::update_expenditure`]. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct ExpenditureUpdate {
    pub name: Option<String>,
    pub value: Option<MoneyCents>,
    pub date: Option<DateTime<Utc>>,
    pub is_expected: Option<bool>,
    pub category_id: Option<Uuid>,
    /// `Some(None)` clears the link.
    pub expected_expenditure_id: Option<Option<Uuid>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpenditureKind {
    #[default]
    Both,
    Actual,
    Expected,
}

/// Filters for listing expenditures.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct ExpenditureListFilter {
    /// Substring match on the name.
    pub name_query: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_value: Option<MoneyCents>,
    pub max_value: Option<MoneyCents>,
    pub kind: ExpenditureKind,
}

fn validate_list_filter(filter: &ExpenditureListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if let (Some(min), Some(max)) = (filter.min_value, filter.max_value)
        && min > max
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: min_value must be <= max_value".to_string(),
        ));
    }
    Ok(())
}

fn parse_category_id(raw: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw).map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))
}

fn parse_expected_id(raw: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| EngineError::KeyNotFound("expected expenditure not exists".to_string()))
}

impl Engine {
    /// Add a new expenditure (budget line or real spend).
    ///
    /// An expected line can never carry a link; supplying both is rejected.
    /// When an actual is linked to an expected line of a different category,
    /// the expenditure is silently filed under the expected line's category.
    /// The owning ledger is always derived from the final category.
    pub async fn new_expenditure(
        &self,
        input: NewExpenditure,
        username: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&input.name, "expenditure")?;
        if input.is_expected && input.expected_expenditure_id.is_some() {
            return Err(EngineError::ConflictingExpectation);
        }
        let date = input.date.unwrap_or_else(Utc::now);

        with_tx!(self, |db_tx| {
            let mut category = self.require_category(&db_tx, input.category_id, username).await?;
            if let Some(link) = input.expected_expenditure_id {
                let expected = self
                    .require_expected_expenditure(&db_tx, link, username)
                    .await?;
                if expected.category_id != category.id {
                    category = self
                        .require_category(&db_tx, parse_category_id(&expected.category_id)?, username)
                        .await?;
                }
            }

            let expenditure = Expenditure {
                id: Uuid::new_v4(),
                name: name.clone(),
                value: input.value,
                date,
                is_expected: input.is_expected,
                category_id: parse_category_id(&category.id)?,
                ledger_id: category.ledger_id.clone(),
                created_by: username.to_string(),
                expected_expenditure_id: input.expected_expenditure_id,
            };
            expenditures::ActiveModel::from(&expenditure).insert(&db_tx).await?;
            Ok(expenditure.id)
        })
    }

    /// Update an expenditure, re-running the linkage rules on the result.
    ///
    /// Turning a row expected while a link is stored silently clears the
    /// link; explicitly supplying a link on a row that ends up expected is the
    /// hard conflict.
    pub async fn update_expenditure(
        &self,
        expenditure_id: Uuid,
        update: ExpenditureUpdate,
        username: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_expenditure(&db_tx, expenditure_id, username).await?;

            let is_expected = update.is_expected.unwrap_or(model.is_expected);
            if is_expected && matches!(update.expected_expenditure_id, Some(Some(_))) {
                return Err(EngineError::ConflictingExpectation);
            }
            let link: Option<String> = if is_expected {
                None
            } else {
                match update.expected_expenditure_id {
                    Some(link) => link.map(|id| id.to_string()),
                    None => model.expected_expenditure_id.clone(),
                }
            };

            let mut category = match update.category_id {
                Some(id) => self.require_category(&db_tx, id, username).await?,
                None => {
                    self.require_category(&db_tx, parse_category_id(&model.category_id)?, username)
                        .await?
                }
            };
            if let Some(link_id) = &link {
                let expected = self
                    .require_expected_expenditure(&db_tx, parse_expected_id(link_id)?, username)
                    .await?;
                if expected.category_id != category.id {
                    category = self
                        .require_category(&db_tx, parse_category_id(&expected.category_id)?, username)
                        .await?;
                }
            }

            let mut active = expenditures::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                is_expected: ActiveValue::Set(is_expected),
                category_id: ActiveValue::Set(category.id.clone()),
                ledger_id: ActiveValue::Set(category.ledger_id.clone()),
                expected_expenditure_id: ActiveValue::Set(link),
                ..Default::default()
            };
            if let Some(name) = &update.name {
                active.name = ActiveValue::Set(normalize_required_name(name, "expenditure")?);
            }
            if let Some(value) = update.value {
                active.value_cents = ActiveValue::Set(value.cents());
            }
            if let Some(date) = update.date {
                active.date = ActiveValue::Set(date);
            }
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete an expenditure. Deleting an expected line first nulls the
    /// back-reference of every actual linked to it.
    pub async fn delete_expenditure(
        &self,
        expenditure_id: Uuid,
        username: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_expenditure(&db_tx, expenditure_id, username).await?;
            if model.is_expected {
                expenditures::Entity::update_many()
                    .col_expr(
                        expenditures::Column::ExpectedExpenditureId,
                        Expr::value(Option::<String>::None),
                    )
                    .filter(expenditures::Column::ExpectedExpenditureId.eq(model.id.clone()))
                    .exec(&db_tx)
                    .await?;
            }
            expenditures::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Return one expenditure visible to `username`.
    pub async fn expenditure(
        &self,
        expenditure_id: Uuid,
        username: &str,
    ) -> ResultEngine<Expenditure> {
        with_tx!(self, |db_tx| {
            let model = self.require_expenditure(&db_tx, expenditure_id, username).await?;
            Expenditure::try_from(model)
        })
    }

    /// The expected/actual/delta view of one expenditure.
    pub async fn expenditure_prospect(
        &self,
        expenditure_id: Uuid,
        username: &str,
    ) -> ResultEngine<ExpenditureProspect> {
        with_tx!(self, |db_tx| {
            let model = self.require_expenditure(&db_tx, expenditure_id, username).await?;

            let prospect = if model.is_expected {
                let actual = self.sum_linked_actuals(&db_tx, &model.id).await?;
                let expected = MoneyCents::new(model.value_cents);
                ExpenditureProspect {
                    actual: MoneyCents::new(actual),
                    expected: Some(expected),
                    delta: Some(expected - MoneyCents::new(actual)),
                }
            } else if let Some(link_id) = &model.expected_expenditure_id {
                let expected_model = expenditures::Entity::find_by_id(link_id.clone())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound("expected expenditure not exists".to_string())
                    })?;
                let actual = self.sum_linked_actuals(&db_tx, link_id).await?;
                let expected = MoneyCents::new(expected_model.value_cents);
                ExpenditureProspect {
                    actual: MoneyCents::new(actual),
                    expected: Some(expected),
                    delta: Some(expected - MoneyCents::new(actual)),
                }
            } else {
                ExpenditureProspect {
                    actual: MoneyCents::new(model.value_cents),
                    expected: None,
                    delta: None,
                }
            };
            Ok(prospect)
        })
    }

    /// Expenditures of a ledger matching a filter, newest first.
    pub async fn list_expenditures(
        &self,
        ledger_id: &str,
        filter: &ExpenditureListFilter,
        username: &str,
    ) -> ResultEngine<Vec<Expenditure>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;

            let mut query = expenditures::Entity::find()
                .filter(expenditures::Column::LedgerId.eq(ledger_id.to_string()))
                .order_by_desc(expenditures::Column::Date);
            if let Some(name_query) = &filter.name_query {
                query = query.filter(expenditures::Column::Name.contains(name_query));
            }
            if let Some(from) = filter.from {
                query = query.filter(expenditures::Column::Date.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(expenditures::Column::Date.lt(to));
            }
            if let Some(min) = filter.min_value {
                query = query.filter(expenditures::Column::ValueCents.gte(min.cents()));
            }
            if let Some(max) = filter.max_value {
                query = query.filter(expenditures::Column::ValueCents.lte(max.cents()));
            }
            match filter.kind {
                ExpenditureKind::Both => {}
                ExpenditureKind::Actual => {
                    query = query.filter(expenditures::Column::IsExpected.eq(false));
                }
                ExpenditureKind::Expected => {
                    query = query.filter(expenditures::Column::IsExpected.eq(true));
                }
            }

            let models = query.all(&db_tx).await?;
            models.into_iter().map(Expenditure::try_from).collect()
        })
    }

    /// Duplicate the previous month's expected lines into the target window,
    /// each shifted forward by one calendar month. Returns how many lines were
    /// copied.
    pub async fn copy_expected_from_previous_month(
        &self,
        ledger_id: &str,
        window: &MonthWindow,
        username: &str,
    ) -> ResultEngine<u64> {
        let precedent = window.precedent(self.timezone)?;
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;

            let models = expenditures::Entity::find()
                .filter(expenditures::Column::LedgerId.eq(ledger_id.to_string()))
                .filter(expenditures::Column::IsExpected.eq(true))
                .filter(expenditures::Column::Date.gte(precedent.start))
                .filter(expenditures::Column::Date.lt(precedent.end))
                .order_by_asc(expenditures::Column::Date)
                .all(&db_tx)
                .await?;

            let mut copied = 0u64;
            for model in models {
                // Calendar clamping (e.g. Jan 31 -> Feb 28) keeps the shifted
                // date inside the target window; anything that still escapes
                // it lands on the window start.
                let date = model
                    .date
                    .with_timezone(&self.timezone)
                    .checked_add_months(Months::new(1))
                    .map(|shifted| shifted.with_timezone(&Utc))
                    .filter(|shifted| window.contains(*shifted))
                    .unwrap_or(window.start);
                let copy = Expenditure {
                    id: Uuid::new_v4(),
                    name: model.name.clone(),
                    value: MoneyCents::new(model.value_cents),
                    date,
                    is_expected: true,
                    category_id: parse_category_id(&model.category_id)?,
                    ledger_id: model.ledger_id.clone(),
                    created_by: username.to_string(),
                    expected_expenditure_id: None,
                };
                expenditures::ActiveModel::from(&copy).insert(&db_tx).await?;
                copied += 1;
            }
            Ok(copied)
        })
    }

    /// Sum of every actual linked to one expected line, in cents.
    async fn sum_linked_actuals(
        &self,
        db: &sea_orm::DatabaseTransaction,
        expected_id: &str,
    ) -> ResultEngine<i64> {
        let sum: Option<Option<i64>> = expenditures::Entity::find()
            .select_only()
            .column_as(expenditures::Column::ValueCents.sum(), "sum")
            .filter(expenditures::Column::ExpectedExpenditureId.eq(expected_id.to_string()))
            .into_tuple()
            .one(db)
            .await?;
        Ok(sum.flatten().unwrap_or(0))
    }
}
