//! Transaction value type and conversion from raw persisted records.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MalformedRecordError;

/// Decimal with optional sign, leading `$`, `,` thousands separators and exponent.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\$?(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?$")
        .expect("amount pattern is valid")
});

/// Date of an expense. Text from storage or user input stays `Raw` and is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionDate {
    Calendar(NaiveDate),
    Raw(String),
}

impl fmt::Display for TransactionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionDate::Calendar(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TransactionDate::Raw(s) => f.write_str(s),
        }
    }
}

impl From<NaiveDate> for TransactionDate {
    fn from(d: NaiveDate) -> Self {
        TransactionDate::Calendar(d)
    }
}

impl From<&str> for TransactionDate {
    fn from(s: &str) -> Self {
        TransactionDate::Raw(s.to_string())
    }
}

impl From<String> for TransactionDate {
    fn from(s: String) -> Self {
        TransactionDate::Raw(s)
    }
}

/// One recorded expense event. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    date: TransactionDate,
    description: String,
    /// Signed, no currency conversion.
    amount: f64,
    category: String,
}

impl Transaction {
    pub fn new(
        date: impl Into<TransactionDate>,
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
            category: category.into(),
        }
    }

    pub fn date(&self) -> &TransactionDate {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Copy of this transaction with its category lower-cased.
    pub(crate) fn normalized(self) -> Self {
        let category = self.category.to_lowercase();
        Self { category, ..self }
    }
}

/// A record as it comes out of storage: every field is optional text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<&Transaction> for RawRecord {
    fn from(t: &Transaction) -> Self {
        RawRecord {
            date: Some(t.date.to_string()),
            description: Some(t.description.clone()),
            amount: Some(format_amount(t.amount)),
            category: Some(t.category.clone()),
        }
    }
}

impl TryFrom<RawRecord> for Transaction {
    type Error = MalformedRecordError;

    /// Only `amount` is required; missing text fields become empty strings.
    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let amount_text = raw
            .amount
            .ok_or_else(|| MalformedRecordError::new("amount", "is missing"))?;
        let amount = parse_amount(&amount_text)?;

        Ok(Transaction::new(
            TransactionDate::Raw(raw.date.unwrap_or_default()),
            raw.description.unwrap_or_default(),
            amount,
            raw.category.unwrap_or_default(),
        ))
    }
}

/// Parse a stored amount such as `12.5`, `-3`, `$1,204.10`, `1e-5`. The result is always finite.
pub fn parse_amount(text: &str) -> Result<f64, MalformedRecordError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MalformedRecordError::new("amount", "is empty"));
    }
    if !AMOUNT_RE.is_match(trimmed) {
        return Err(MalformedRecordError::new(
            "amount",
            format!("is not numeric: {trimmed:?}"),
        ));
    }
    let cleaned: String = trimmed.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    let amount = cleaned
        .parse::<f64>()
        .map_err(|e| MalformedRecordError::new("amount", format!("{trimmed:?}: {e}")))?;
    if !amount.is_finite() {
        return Err(MalformedRecordError::new(
            "amount",
            format!("is out of range: {trimmed:?}"),
        ));
    }
    Ok(amount)
}

/// Shortest round-trip form that always keeps a fractional part (`5.0`, `12.25`).
pub fn format_amount(amount: f64) -> String {
    format!("{amount:?}")
}
