//! Human-facing digest of a single cluster.

use std::collections::BTreeMap;

use tally_core::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub label: usize,
    pub count: usize,
    pub total: f64,
    pub mean_amount: f64,
    /// Most frequent category; ties go to the lexically smallest.
    pub dominant_category: String,
    pub description: String,
}

impl ClusterSummary {
    pub fn from_cluster(label: usize, transactions: &[Transaction]) -> Self {
        let count = transactions.len();
        let total: f64 = transactions.iter().map(Transaction::amount).sum();
        let mean_amount = if count == 0 { 0.0 } else { total / count as f64 };

        let mut freq: BTreeMap<&str, usize> = BTreeMap::new();
        for t in transactions {
            *freq.entry(t.category()).or_insert(0) += 1;
        }
        // max_by_key keeps the last maximum; iterate in reverse so the smallest key wins.
        let dominant_category = freq
            .iter()
            .rev()
            .max_by_key(|(_, n)| **n)
            .map(|(c, _)| c.to_string())
            .unwrap_or_default();

        let noun = if count == 1 { "expense" } else { "expenses" };
        let focus = if dominant_category.is_empty() {
            "uncategorized".to_string()
        } else {
            format!("mostly {dominant_category}")
        };
        let description = format!(
            "Cluster {label}: {count} {noun}, {focus}, averaging {mean_amount:.2} (total {total:.2})"
        );

        Self {
            label,
            count,
            total,
            mean_amount,
            dominant_category,
            description,
        }
    }
}
