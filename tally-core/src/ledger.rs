//! The ledger: configured category labels plus an append-only list of expenses.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, UnknownCategoryError};
use crate::transaction::Transaction;

/// How the ledger treats categories outside its configured set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Unknown categories are stored and contribute nothing to per-category totals.
    #[default]
    Lenient,
    /// Unknown categories are rejected with [`UnknownCategoryError`].
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    categories: Vec<String>,
    expenses: Vec<Transaction>,
    strictness: Strictness,
}

impl Ledger {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_strictness(categories, Strictness::Lenient)
    }

    pub fn with_strictness<I, S>(categories: I, strictness: Strictness) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            expenses: Vec::new(),
            strictness,
        }
    }

    /// Display labels, in configured order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Expenses in insertion order.
    pub fn expenses(&self) -> &[Transaction] {
        &self.expenses
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Case-insensitive membership in the configured set.
    pub fn is_known_category(&self, category: &str) -> bool {
        let needle = category.to_lowercase();
        self.categories.iter().any(|c| c.to_lowercase() == needle)
    }

    /// Append an expense, lower-casing its category.
    ///
    /// Lenient ledgers never fail. Strict ledgers reject a non-empty category
    /// outside the configured set and leave the ledger unchanged.
    pub fn add_expense(&mut self, transaction: Transaction) -> Result<()> {
        let transaction = transaction.normalized();
        if self.strictness == Strictness::Strict
            && !transaction.category().is_empty()
            && !self.is_known_category(transaction.category())
        {
            warn!(category = transaction.category(), "rejecting expense with unknown category");
            return Err(UnknownCategoryError {
                category: transaction.category().to_string(),
            }
            .into());
        }
        self.expenses.push(transaction);
        Ok(())
    }

    /// Add every transaction in order. Stops at the first rejection.
    pub fn extend<I>(&mut self, transactions: I) -> Result<()>
    where
        I: IntoIterator<Item = Transaction>,
    {
        for t in transactions {
            self.add_expense(t)?;
        }
        debug!(expenses = self.expenses.len(), "ledger extended");
        Ok(())
    }

    pub fn total_expenditure(&self) -> f64 {
        sum_amounts(self.expenses.iter())
    }

    /// Sum of expenses whose stored category equals `category` lower-cased.
    ///
    /// Matching is literal: a category outside the configured set still sums
    /// whatever expenses carry it (strict ledgers reject it instead).
    pub fn category_expenditure(&self, category: &str) -> Result<f64> {
        if self.strictness == Strictness::Strict
            && !category.is_empty()
            && !self.is_known_category(category)
        {
            return Err(UnknownCategoryError {
                category: category.to_string(),
            }
            .into());
        }
        let needle = category.to_lowercase();
        Ok(sum_amounts(self.expenses.iter().filter(|e| e.category() == needle)))
    }

    /// Total per configured label, in configured order.
    pub fn category_breakdown(&self) -> Vec<(String, f64)> {
        self.categories
            .iter()
            .map(|label| {
                let needle = label.to_lowercase();
                let total = sum_amounts(self.expenses.iter().filter(|e| e.category() == needle));
                (label.clone(), total)
            })
            .collect()
    }
}

/// Starts from `+0.0`, so an empty total is zero rather than `-0.0`.
fn sum_amounts<'a>(expenses: impl Iterator<Item = &'a Transaction>) -> f64 {
    expenses.map(Transaction::amount).fold(0.0, |acc, a| acc + a)
}
