use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, cashes, categories, expenditures, ledger_memberships, ledgers,
    users,
};

use super::Engine;

/// Visibility helpers.
///
/// Every ledger member has full read/write access to the ledger's content, so
/// "visible" and "member of the owning ledger" are the same check. Lookups
/// that fail the check report `KeyNotFound` rather than a permission error, so
/// callers cannot probe for ids they are not allowed to see.
impl Engine {
    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    pub(super) async fn require_ledger_member(
        &self,
        db: &DatabaseTransaction,
        ledger_id: &str,
        username: &str,
    ) -> ResultEngine<ledgers::Model> {
        let model = ledgers::Entity::find_by_id(ledger_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("ledger not exists".to_string()))?;
        let member =
            ledger_memberships::Entity::find_by_id((ledger_id.to_string(), username.to_string()))
                .one(db)
                .await?
                .is_some();
        if !member {
            return Err(EngineError::KeyNotFound("ledger not exists".to_string()));
        }
        Ok(model)
    }

    pub(super) async fn require_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        username: &str,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        self.require_ledger_member(db, &model.ledger_id, username)
            .await
            .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?;
        Ok(model)
    }

    pub(super) async fn require_cash(
        &self,
        db: &DatabaseTransaction,
        cash_id: Uuid,
        username: &str,
    ) -> ResultEngine<cashes::Model> {
        let model = cashes::Entity::find_by_id(cash_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("cash not exists".to_string()))?;
        self.require_ledger_member(db, &model.ledger_id, username)
            .await
            .map_err(|_| EngineError::KeyNotFound("cash not exists".to_string()))?;
        Ok(model)
    }

    pub(super) async fn require_expenditure(
        &self,
        db: &DatabaseTransaction,
        expenditure_id: Uuid,
        username: &str,
    ) -> ResultEngine<expenditures::Model> {
        let model = expenditures::Entity::find_by_id(expenditure_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expenditure not exists".to_string()))?;
        self.require_ledger_member(db, &model.ledger_id, username)
            .await
            .map_err(|_| EngineError::KeyNotFound("expenditure not exists".to_string()))?;
        Ok(model)
    }

    /// A linked expected expenditure must exist, carry `is_expected = true`
    /// and live in a ledger visible to the caller.
    pub(super) async fn require_expected_expenditure(
        &self,
        db: &DatabaseTransaction,
        expected_id: Uuid,
        username: &str,
    ) -> ResultEngine<expenditures::Model> {
        let not_found =
            || EngineError::KeyNotFound("expected expenditure not exists".to_string());
        let model = self
            .require_expenditure(db, expected_id, username)
            .await
            .map_err(|err| match err {
                EngineError::KeyNotFound(_) => not_found(),
                other => other,
            })?;
        if !model.is_expected {
            return Err(not_found());
        }
        Ok(model)
    }
}
