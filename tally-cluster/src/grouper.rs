//! Cluster Grouper: k-means over an encoded matrix, labels mapped back to transactions.

use std::collections::BTreeMap;

use tally_core::{EmptyInputError, Error, Result, Transaction};
use tracing::debug;

use crate::encoder::FeatureMatrix;
use crate::kmeans::{self, KMeansConfig};
use crate::summary::ClusterSummary;

/// Upper bound on the number of clusters a recommendation produces.
pub const MAX_CLUSTERS: usize = 3;

/// `min(MAX_CLUSTERS, rows)`.
pub fn cluster_count(rows: usize) -> usize {
    MAX_CLUSTERS.min(rows)
}

/// Transactions partitioned by cluster label.
///
/// Labels only mean "same cluster / different cluster". Within a cluster the
/// original input order is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    clusters: BTreeMap<usize, Vec<Transaction>>,
    inertia: f64,
}

impl Recommendations {
    pub fn clusters(&self) -> &BTreeMap<usize, Vec<Transaction>> {
        &self.clusters
    }

    pub fn into_clusters(self) -> BTreeMap<usize, Vec<Transaction>> {
        self.clusters
    }

    pub fn get(&self, label: usize) -> Option<&[Transaction]> {
        self.clusters.get(&label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Transaction])> {
        self.clusters.iter().map(|(&l, t)| (l, t.as_slice()))
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Transactions across all clusters.
    pub fn total_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.iter()
            .map(|(label, txns)| ClusterSummary::from_cluster(label, txns))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterGrouper {
    kmeans: KMeansConfig,
}

impl ClusterGrouper {
    pub fn new(kmeans: KMeansConfig) -> Self {
        Self { kmeans }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.kmeans
    }

    /// `transactions` must be the sequence `matrix` was encoded from.
    pub fn group(&self, matrix: &FeatureMatrix, transactions: &[Transaction]) -> Result<Recommendations> {
        if matrix.is_empty() {
            return Err(EmptyInputError.into());
        }
        if matrix.n_rows() != transactions.len() {
            return Err(Error::ShapeMismatch {
                rows: matrix.n_rows(),
                transactions: transactions.len(),
            });
        }

        let k = cluster_count(matrix.n_rows());
        debug_assert!(k > 0);
        let fit = kmeans::fit(matrix.rows(), k, &self.kmeans)?;

        let mut clusters: BTreeMap<usize, Vec<Transaction>> = BTreeMap::new();
        for (label, txn) in fit.labels.iter().zip(transactions) {
            clusters.entry(*label).or_default().push(txn.clone());
        }

        debug!(k, clusters = clusters.len(), inertia = fit.inertia, "grouped transactions");
        Ok(Recommendations {
            clusters,
            inertia: fit.inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureEncoder;

    fn seeded() -> ClusterGrouper {
        ClusterGrouper::new(KMeansConfig::default().with_seed(2024))
    }

    #[test]
    fn test_cluster_count() {
        assert_eq!(cluster_count(1), 1);
        assert_eq!(cluster_count(2), 2);
        assert_eq!(cluster_count(3), 3);
        assert_eq!(cluster_count(250), 3);
    }

    #[test]
    fn test_group_partitions_input() {
        let txns: Vec<_> = (0..10)
            .map(|i| Transaction::new("d", format!("item {i}"), i as f64 * 7.5, "groceries"))
            .collect();
        let matrix = FeatureEncoder::default().encode(&txns).unwrap();
        let recs = seeded().group(&matrix, &txns).unwrap();

        assert!(recs.len() <= 3);
        assert_eq!(recs.total_count(), 10);
        for t in &txns {
            let hits = recs.iter().filter(|(_, ts)| ts.contains(t)).count();
            assert_eq!(hits, 1, "{} must land in exactly one cluster", t.description());
        }
    }

    #[test]
    fn test_group_keeps_input_order_within_cluster() {
        let txns = vec![
            Transaction::new("d", "a", 1.0, "x"),
            Transaction::new("d", "b", 100.0, "x"),
            Transaction::new("d", "c", 2.0, "x"),
            Transaction::new("d", "d", 101.0, "x"),
            Transaction::new("d", "e", 3.0, "x"),
        ];
        let matrix = FeatureEncoder::default().encode(&txns).unwrap();
        let recs = seeded().group(&matrix, &txns).unwrap();
        let position = |t: &Transaction| txns.iter().position(|x| x == t).unwrap();
        for (_, members) in recs.iter() {
            let idx: Vec<_> = members.iter().map(position).collect();
            assert!(idx.windows(2).all(|w| w[0] < w[1]), "order broken: {idx:?}");
        }
    }

    #[test]
    fn test_single_transaction_single_cluster() {
        let txns = vec![Transaction::new("d", "milk", 5.0, "groceries")];
        let matrix = FeatureEncoder::default().encode(&txns).unwrap();
        let recs = seeded().group(&matrix, &txns).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs.get(0).unwrap(), txns.as_slice());
    }

    #[test]
    fn test_shape_mismatch() {
        let txns = vec![
            Transaction::new("d", "milk", 5.0, "groceries"),
            Transaction::new("d", "bread", 4.0, "groceries"),
        ];
        let matrix = FeatureEncoder::default().encode(&txns).unwrap();
        let err = seeded().group(&matrix, &txns[..1]).unwrap_err();
        assert_eq!(err, Error::ShapeMismatch { rows: 2, transactions: 1 });
    }
}
