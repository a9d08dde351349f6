//! Ledger primitives.
//!
//! A `Ledger` is a shared financial scope: categories, cash registrations and
//! expenditures all hang off one ledger, and every member user has full
//! read/write access to its content.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Ledger {
    pub fn new(name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::cashes::Entity")]
    Cashes,
    #[sea_orm(has_many = "super::expenditures::Entity")]
    Expenditures,
    #[sea_orm(has_many = "super::ledger_memberships::Entity")]
    Memberships,
}

impl Related<super::ledger_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Ledger> for ActiveModel {
    fn from(ledger: &Ledger) -> Self {
        Self {
            id: ActiveValue::Set(ledger.id.clone()),
            name: ActiveValue::Set(ledger.name.clone()),
            created_at: ActiveValue::Set(ledger.created_at),
        }
    }
}

impl From<Model> for Ledger {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
