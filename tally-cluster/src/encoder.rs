//! Feature encoding: transactions to a numeric matrix.
//!
//! Text fields are dropped. Column 0 is the raw `amount`, followed by one
//! 0/1 indicator column per category in the vocabulary.

use std::collections::BTreeSet;

use tally_core::{EmptyInputError, Result, Transaction};
use tracing::debug;

pub const AMOUNT_COLUMN: &str = "amount";
pub const CATEGORY_PREFIX: &str = "category_";

/// Which categories get an indicator column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Vocabulary {
    /// Distinct categories present in the batch, sorted lexically.
    /// The column set depends on the batch.
    #[default]
    Observed,
    /// A fixed label list, lower-cased, in the given order. Categories outside
    /// it encode as all-zero indicators.
    Configured(Vec<String>),
}

impl Vocabulary {
    pub fn configured<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let labels = labels
            .into_iter()
            .map(|l| l.as_ref().to_lowercase())
            .filter(|l| seen.insert(l.clone()))
            .collect();
        Vocabulary::Configured(labels)
    }

    fn resolve(&self, transactions: &[Transaction]) -> Vec<String> {
        match self {
            Vocabulary::Observed => transactions
                .iter()
                .map(|t| t.category().to_lowercase())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Vocabulary::Configured(labels) => labels.clone(),
        }
    }
}

/// Dense row-major matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    vocabulary: Vocabulary,
}

impl FeatureEncoder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn encode(&self, transactions: &[Transaction]) -> Result<FeatureMatrix> {
        if transactions.is_empty() {
            return Err(EmptyInputError.into());
        }

        let vocab = self.vocabulary.resolve(transactions);
        let mut columns = Vec::with_capacity(vocab.len() + 1);
        columns.push(AMOUNT_COLUMN.to_string());
        columns.extend(vocab.iter().map(|c| format!("{CATEGORY_PREFIX}{c}")));

        let rows = transactions
            .iter()
            .map(|t| {
                let category = t.category().to_lowercase();
                let mut row = Vec::with_capacity(columns.len());
                row.push(t.amount());
                row.extend(vocab.iter().map(|c| if *c == category { 1.0 } else { 0.0 }));
                row
            })
            .collect();

        debug!(rows = transactions.len(), cols = columns.len(), "encoded feature matrix");
        Ok(FeatureMatrix { columns, rows })
    }
}
