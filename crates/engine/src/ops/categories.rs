use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new category inside a ledger.
    ///
    /// Category names are unique per ledger (case-insensitive).
    pub async fn new_category(
        &self,
        ledger_id: &str,
        name: &str,
        username: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;

            let exists = categories::Entity::find()
                .filter(categories::Column::LedgerId.eq(ledger_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let category = Category::new(name, ledger_id.to_string());
            categories::ActiveModel::from(&category).insert(&db_tx).await?;
            Ok(category.id)
        })
    }

    /// Delete a category. Its expenditures go with it (cascading foreign key).
    pub async fn delete_category(&self, category_id: Uuid, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, username).await?;
            categories::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Return one category visible to `username`.
    pub async fn category(&self, category_id: Uuid, username: &str) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, username).await?;
            Category::try_from(model)
        })
    }

    /// All categories of a ledger, sorted by name.
    pub async fn list_categories(
        &self,
        ledger_id: &str,
        username: &str,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_member(&db_tx, ledger_id, username).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::LedgerId.eq(ledger_id.to_string()))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Category::try_from).collect()
        })
    }
}
