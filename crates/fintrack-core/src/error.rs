use fintrack_domain::{AmountError, Money, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::RuleFailure;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds")]
    InsufficientFunds { requested: Money, available: Money },
    #[error("{} recurring rule(s) failed to generate", .failures.len())]
    PartialBatchFailure {
        generated: Vec<Transaction>,
        failures: Vec<RuleFailure>,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        CoreError::NotFound { entity, id }
    }
}

impl From<AmountError> for CoreError {
    fn from(err: AmountError) -> Self {
        CoreError::InvalidAmount(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}
