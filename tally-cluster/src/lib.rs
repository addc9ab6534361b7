//! tally-cluster: feature encoding, k-means, and expense recommendations

pub mod encoder;
pub mod grouper;
pub mod kmeans;
pub mod recommend;
pub mod summary;

pub use encoder::{FeatureEncoder, FeatureMatrix, Vocabulary};
pub use grouper::{ClusterGrouper, MAX_CLUSTERS, Recommendations, cluster_count};
pub use kmeans::{KMeansConfig, KMeansFit};
pub use recommend::{Recommend, RecommendConfig, VocabularyMode};
pub use summary::ClusterSummary;
