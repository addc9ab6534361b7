//! The recommendation pipeline: Feature Encoder → Cluster Grouper over a ledger snapshot.

use serde::{Deserialize, Serialize};
use tally_core::{Ledger, Result};
use tracing::info;

use crate::encoder::{FeatureEncoder, Vocabulary};
use crate::grouper::{ClusterGrouper, Recommendations};
use crate::kmeans::KMeansConfig;

/// Where the one-hot vocabulary comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyMode {
    /// Categories present in the ledger's expenses.
    #[default]
    Observed,
    /// The ledger's configured labels.
    Configured,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub vocabulary: VocabularyMode,
    pub kmeans: KMeansConfig,
}

impl RecommendConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            kmeans: KMeansConfig::default().with_seed(seed),
            ..Self::default()
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: VocabularyMode) -> Self {
        self.vocabulary = vocabulary;
        self
    }
}

/// Clustering entry point for anything that owns expenses.
pub trait Recommend {
    fn recommend(&self, config: &RecommendConfig) -> Result<Recommendations>;
}

impl Recommend for Ledger {
    /// Fails with `EmptyInputError` when the ledger has no expenses. The
    /// ledger itself is never touched.
    fn recommend(&self, config: &RecommendConfig) -> Result<Recommendations> {
        let vocabulary = match config.vocabulary {
            VocabularyMode::Observed => Vocabulary::Observed,
            VocabularyMode::Configured => Vocabulary::configured(self.categories()),
        };
        let matrix = FeatureEncoder::new(vocabulary).encode(self.expenses())?;
        let recs = ClusterGrouper::new(config.kmeans.clone()).group(&matrix, self.expenses())?;
        info!(
            expenses = self.len(),
            clusters = recs.len(),
            "built expense recommendations"
        );
        Ok(recs)
    }
}
