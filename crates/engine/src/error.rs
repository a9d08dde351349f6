//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`ConflictingExpectation`] thrown when an expenditure is both expected
//!   and linked to an expected expenditure.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`ConflictingExpectation`]: EngineError::ConflictingExpectation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("an expected expenditure cannot be linked to another expected expenditure")]
    ConflictingExpectation,
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ConflictingExpectation, Self::ConflictingExpectation) => true,
            (Self::InvalidMonth(a), Self::InvalidMonth(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
