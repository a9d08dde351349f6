use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Ledger, ResultEngine, ledger_memberships, ledgers};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new ledger owned by `username`, who becomes its first member.
    pub async fn new_ledger(&self, name: &str, username: &str) -> ResultEngine<String> {
        let name = normalize_required_name(name, "ledger")?;
        let ledger = Ledger::new(name, Utc::now());
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, username).await?;
            ledgers::ActiveModel::from(&ledger).insert(&db_tx).await?;
            ledger_memberships::ActiveModel {
                ledger_id: ActiveValue::Set(ledger.id.clone()),
                username: ActiveValue::Set(username.to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(ledger.id.clone())
        })
    }

    /// Delete a ledger. Categories, cashes, expenditures and memberships go
    /// with it (cascading foreign keys).
    pub async fn delete_ledger(&self, ledger_id: &str, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_ledger_member(&db_tx, ledger_id, username).await?;
            ledgers::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Return one ledger visible to `username`.
    pub async fn ledger(&self, ledger_id: &str, username: &str) -> ResultEngine<Ledger> {
        with_tx!(self, |db_tx| {
            let model = self.require_ledger_member(&db_tx, ledger_id, username).await?;
            Ok(Ledger::from(model))
        })
    }

    /// Grant `new_member` access to a ledger. Any member can add members.
    pub async fn add_ledger_member(
        &self,
        ledger_id: &str,
        new_member: &str,
        username: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;
            self.require_user_exists(&db_tx, new_member).await?;

            let exists = ledger_memberships::Entity::find_by_id((
                ledger_id.to_string(),
                new_member.to_string(),
            ))
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::ExistingKey(new_member.to_string()));
            }

            ledger_memberships::ActiveModel {
                ledger_id: ActiveValue::Set(ledger_id.to_string()),
                username: ActiveValue::Set(new_member.to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })
    }

    /// Revoke a member's access to a ledger.
    pub async fn remove_ledger_member(
        &self,
        ledger_id: &str,
        member: &str,
        username: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;
            let membership = ledger_memberships::Entity::find_by_id((
                ledger_id.to_string(),
                member.to_string(),
            ))
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
            membership.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// All ledgers `username` is a member of, sorted by name.
    pub async fn ledgers_for_user(&self, username: &str) -> ResultEngine<Vec<Ledger>> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, username).await?;
            let rows: Vec<(ledger_memberships::Model, Option<ledgers::Model>)> =
                ledger_memberships::Entity::find()
                    .filter(ledger_memberships::Column::Username.eq(username))
                    .find_also_related(ledgers::Entity)
                    .order_by_asc(ledgers::Column::Name)
                    .all(&db_tx)
                    .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (_, ledger_model) in rows {
                let Some(ledger_model) = ledger_model else {
                    continue;
                };
                out.push(Ledger::from(ledger_model));
            }
            Ok(out)
        })
    }
}
