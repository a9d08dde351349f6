//! Expenditure primitives.
//!
//! An expenditure is either a budget line (`is_expected = true`) or a real
//! spend. Real spends may point at one expected line through
//! `expected_expenditure_id`; the link is a plain one-to-many back-reference,
//! never a cycle, because expected rows cannot link further.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expenditure {
    pub id: Uuid,
    pub name: String,
    pub value: MoneyCents,
    pub date: DateTime<Utc>,
    pub is_expected: bool,
    pub category_id: Uuid,
    /// Always derived from the category at save time.
    pub ledger_id: String,
    pub created_by: String,
    pub expected_expenditure_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenditures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub value_cents: i64,
    pub date: DateTimeUtc,
    pub is_expected: bool,
    pub category_id: String,
    pub ledger_id: String,
    pub created_by: String,
    pub expected_expenditure_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Ledger,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ExpectedExpenditureId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    ExpectedExpenditure,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expenditure> for ActiveModel {
    fn from(expenditure: &Expenditure) -> Self {
        Self {
            id: ActiveValue::Set(expenditure.id.to_string()),
            name: ActiveValue::Set(expenditure.name.clone()),
            value_cents: ActiveValue::Set(expenditure.value.cents()),
            date: ActiveValue::Set(expenditure.date),
            is_expected: ActiveValue::Set(expenditure.is_expected),
            category_id: ActiveValue::Set(expenditure.category_id.to_string()),
            ledger_id: ActiveValue::Set(expenditure.ledger_id.clone()),
            created_by: ActiveValue::Set(expenditure.created_by.clone()),
            expected_expenditure_id: ActiveValue::Set(
                expenditure.expected_expenditure_id.map(|id| id.to_string()),
            ),
        }
    }
}

impl TryFrom<Model> for Expenditure {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expenditure not exists".to_string()))?,
            name: model.name,
            value: MoneyCents::new(model.value_cents),
            date: model.date,
            is_expected: model.is_expected,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            ledger_id: model.ledger_id,
            created_by: model.created_by,
            expected_expenditure_id: model
                .expected_expenditure_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
        })
    }
}
