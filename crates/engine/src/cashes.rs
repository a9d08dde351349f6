//! Cash registrations.
//!
//! A `Cash` row is either an income event (`is_income = true`, counted in the
//! month containing `reference_date`) or a snapshot of the total current money
//! (`is_income = false`). The latest snapshot inside a month window, ordered by
//! `reference_date` then `recorded_at`, is authoritative for that month.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cash {
    pub id: Uuid,
    pub name: Option<String>,
    pub value: MoneyCents,
    /// Set on every save.
    pub recorded_at: DateTime<Utc>,
    /// The instant the value refers to, which decides the month it counts in.
    pub reference_date: DateTime<Utc>,
    pub is_income: bool,
    pub ledger_id: String,
}

impl Cash {
    pub fn new(
        name: Option<String>,
        value: MoneyCents,
        recorded_at: DateTime<Utc>,
        reference_date: DateTime<Utc>,
        is_income: bool,
        ledger_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            value,
            recorded_at,
            reference_date,
            is_income,
            ledger_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cashes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: Option<String>,
    pub value_cents: i64,
    pub recorded_at: DateTimeUtc,
    pub reference_date: DateTimeUtc,
    pub is_income: bool,
    pub ledger_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Ledger,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Cash> for ActiveModel {
    fn from(cash: &Cash) -> Self {
        Self {
            id: ActiveValue::Set(cash.id.to_string()),
            name: ActiveValue::Set(cash.name.clone()),
            value_cents: ActiveValue::Set(cash.value.cents()),
            recorded_at: ActiveValue::Set(cash.recorded_at),
            reference_date: ActiveValue::Set(cash.reference_date),
            is_income: ActiveValue::Set(cash.is_income),
            ledger_id: ActiveValue::Set(cash.ledger_id.clone()),
        }
    }
}

impl TryFrom<Model> for Cash {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("cash not exists".to_string()))?,
            name: model.name,
            value: MoneyCents::new(model.value_cents),
            recorded_at: model.recorded_at,
            reference_date: model.reference_date,
            is_income: model.is_income,
            ledger_id: model.ledger_id,
        })
    }
}
