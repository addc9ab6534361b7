use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tally_cluster::{KMeansConfig, RecommendConfig, VocabularyMode};
use tally_core::{DEFAULT_CATEGORIES, Strictness};

use crate::state::tally_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerSection,
    pub storage: StorageSection,
    pub clustering: ClusteringSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub categories: Vec<String>,
    /// Reject categories outside `categories` instead of storing them silently.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Relative paths resolve against the tally home directory.
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringSection {
    pub vocabulary: VocabularyMode,
    pub seed: Option<u64>,
    pub max_iterations: usize,
    pub restarts: usize,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            strict: false,
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("transactions.csv"),
        }
    }
}

impl Default for ClusteringSection {
    fn default() -> Self {
        let kmeans = KMeansConfig::default();
        Self {
            vocabulary: VocabularyMode::default(),
            seed: None,
            max_iterations: kmeans.max_iterations,
            restarts: kmeans.restarts,
        }
    }
}

impl Config {
    pub fn strictness(&self) -> Strictness {
        if self.ledger.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn recommend_config(&self) -> RecommendConfig {
        RecommendConfig {
            vocabulary: self.clustering.vocabulary,
            kmeans: KMeansConfig {
                seed: self.clustering.seed,
                max_iterations: self.clustering.max_iterations,
                restarts: self.clustering.restarts,
                ..KMeansConfig::default()
            },
        }
    }

    pub fn data_path(&self, home: &Path) -> PathBuf {
        if self.storage.data_file.is_absolute() {
            self.storage.data_file.clone()
        } else {
            home.join(&self.storage.data_file)
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.toml"))
}

/// Missing file means defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.ledger.categories.len(), 4);
        assert_eq!(cfg.strictness(), Strictness::Lenient);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg = parse_config(
            r#"
[ledger]
strict = true

[clustering]
vocabulary = "configured"
seed = 42
"#,
        )
        .unwrap();
        assert_eq!(cfg.strictness(), Strictness::Strict);
        assert_eq!(cfg.ledger.categories[0], "Groceries");

        let rc = cfg.recommend_config();
        assert_eq!(rc.vocabulary, VocabularyMode::Configured);
        assert_eq!(rc.kmeans.seed, Some(42));
        assert_eq!(rc.kmeans.max_iterations, 300);
        assert_eq!(rc.kmeans.restarts, 10);
    }

    #[test]
    fn test_unknown_vocabulary_is_an_error() {
        assert!(parse_config("[clustering]\nvocabulary = \"sometimes\"\n").is_err());
    }

    #[test]
    fn test_data_path_resolution() {
        let home = Path::new("/home/me/.tally");
        let mut cfg = Config::default();
        assert_eq!(cfg.data_path(home), home.join("transactions.csv"));
        cfg.storage.data_file = PathBuf::from("/srv/ledger.csv");
        assert_eq!(cfg.data_path(home), PathBuf::from("/srv/ledger.csv"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.clustering.seed = Some(7);
        cfg.ledger.categories = vec!["Rent".to_string(), "Food".to_string()];
        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }
}
