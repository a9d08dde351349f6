use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod cashes;
mod categories;
mod expenditures;
mod ledgers;
mod prospect;
mod report;
mod snapshots;

pub use expenditures::{ExpenditureKind, ExpenditureListFilter, ExpenditureUpdate, NewExpenditure};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    timezone: Tz,
    carry_forward: bool,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The timezone month windows are resolved in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    timezone: Tz,
    carry_forward: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            timezone: chrono_tz::UTC,
            carry_forward: false,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Timezone used to resolve month boundaries (defaults to UTC).
    pub fn timezone(mut self, tz: Tz) -> EngineBuilder {
        self.timezone = tz;
        self
    }

    /// When enabled, report and prospect computations persist a synthesized
    /// snapshot for months that have none (get-or-create). Defaults to off;
    /// the carried value is still *reported* either way.
    pub fn carry_forward(mut self, enabled: bool) -> EngineBuilder {
        self.carry_forward = enabled;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            timezone: self.timezone,
            carry_forward: self.carry_forward,
        })
    }
}
