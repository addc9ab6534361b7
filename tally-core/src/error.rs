//! Error taxonomy shared by every tally crate.

use thiserror::Error;

/// Clustering was requested over zero transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not enough data: at least one expense is required")]
pub struct EmptyInputError;

/// A persisted or user-supplied record could not become a [`Transaction`](crate::Transaction).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record: `{field}` {reason}")]
pub struct MalformedRecordError {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Category outside the ledger's configured set (strict mode only).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {category}")]
pub struct UnknownCategoryError {
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    EmptyInput(#[from] EmptyInputError),

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),

    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),

    #[error("feature matrix has {rows} rows but {transactions} transactions were supplied")]
    ShapeMismatch { rows: usize, transactions: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
