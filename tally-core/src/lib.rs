//! tally-core: transactions, the expense ledger, and its aggregation queries

pub mod error;
pub mod ledger;
pub mod prompt;
pub mod transaction;

pub use error::{EmptyInputError, Error, MalformedRecordError, Result, UnknownCategoryError};
pub use ledger::{Ledger, Strictness};
pub use prompt::render_advice_prompt;
pub use transaction::{RawRecord, Transaction, TransactionDate, format_amount, parse_amount};

/// Labels a fresh ledger starts with when the host supplies none.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Groceries", "Entertainment", "Utilities", "Investments"];
