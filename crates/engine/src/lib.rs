pub use categories::Category;
pub use cashes::Cash;
pub use error::EngineError;
pub use expenditures::Expenditure;
pub use ledgers::Ledger;
pub use money::MoneyCents;
pub use month::{MonthWindow, parse_month_spec};
pub use ops::{
    Engine, EngineBuilder, ExpenditureKind, ExpenditureListFilter, ExpenditureUpdate,
    NewExpenditure,
};
pub use report::{
    ExpenditureProspect, MonthlyReport, MonthlyReportEntry, Prospect, TimeBoundaries,
    WARN_MONTH_WITHOUT_SNAPSHOT, WARN_NO_ACTUAL_MONEY, WARN_NO_PRECEDENT_MONEY,
    WARN_STALE_PRECEDENT,
};

mod categories;
mod cashes;
mod error;
mod expenditures;
mod ledger_memberships;
mod ledgers;
mod money;
mod month;
mod ops;
mod report;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
