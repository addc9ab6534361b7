//! Lloyd's k-means with k-means++ seeding.
//!
//! Euclidean distance, squared-error objective. Each restart seeds fresh
//! centroids from the same generator; the lowest-inertia run wins, the
//! earliest run on ties.

use serde::{Deserialize, Serialize};
use tally_core::{EmptyInputError, Result};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Fixed seed for reproducible runs. `None` draws a fresh seed per fit.
    pub seed: Option<u64>,
    pub max_iterations: usize,
    /// Convergence threshold on total squared centroid shift, relative to the
    /// mean per-column variance of the data.
    pub tolerance: f64,
    pub restarts: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_iterations: 300,
            tolerance: 1e-4,
            restarts: 10,
        }
    }
}

impl KMeansConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// One label in `0..k` per input row.
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
    /// Lloyd iterations of the winning run.
    pub iterations: usize,
}

/// Fit `k` clusters over `rows`. All rows must have the same width.
pub fn fit(rows: &[Vec<f64>], k: usize, config: &KMeansConfig) -> Result<KMeansFit> {
    if rows.is_empty() {
        return Err(EmptyInputError.into());
    }
    debug_assert!(k >= 1 && k <= rows.len(), "k must be in 1..=rows");
    let k = k.clamp(1, rows.len());

    // Low 64 bits of a v4 uuid; all of them are random, the truncation is intended.
    let seed = config.seed.unwrap_or_else(|| Uuid::new_v4().as_u128() as u64);
    let mut rng = SplitMix64::new(seed);
    let threshold = config.tolerance * mean_variance(rows);

    let mut best: Option<KMeansFit> = None;
    for _ in 0..config.restarts.max(1) {
        let initial = kmeans_plus_plus(rows, k, &mut rng);
        let run = lloyd(rows, initial, config.max_iterations, threshold);
        if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    let best = best.ok_or(EmptyInputError)?;
    debug!(
        rows = rows.len(),
        k,
        seed,
        iterations = best.iterations,
        inertia = best.inertia,
        "k-means converged"
    );
    Ok(best)
}

fn lloyd(rows: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iterations: usize, threshold: f64) -> KMeansFit {
    let mut labels = assign(rows, &centroids);
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        let updated = recompute(rows, &labels, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = updated;

        let next = assign(rows, &centroids);
        let stable = next == labels;
        labels = next;
        if stable || shift <= threshold {
            break;
        }
    }

    let inertia = rows
        .iter()
        .zip(&labels)
        .map(|(row, &l)| squared_distance(row, &centroids[l]))
        .sum();

    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Nearest centroid per row; ties go to the lower index.
fn assign(rows: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    rows.iter()
        .map(|row| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (i, c) in centroids.iter().enumerate() {
                let d = squared_distance(row, c);
                if d < best_dist {
                    best = i;
                    best_dist = d;
                }
            }
            best
        })
        .collect()
}

/// Mean of each cluster's rows. An empty cluster keeps its previous centroid.
fn recompute(rows: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; width]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (row, &l) in rows.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(row) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

/// k-means++: first centroid uniform, the rest drawn proportional to squared
/// distance from the nearest centroid chosen so far.
fn kmeans_plus_plus(rows: &[Vec<f64>], k: usize, rng: &mut SplitMix64) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(rows[rng.below(rows.len())].clone());

    let mut nearest: Vec<f64> = rows
        .iter()
        .map(|r| squared_distance(r, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.next_f64() * total;
            let mut acc = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or(rows.len() - 1)
        } else {
            // Every row coincides with a chosen centroid.
            rng.below(rows.len())
        };

        let chosen = rows[pick].clone();
        for (n, r) in nearest.iter_mut().zip(rows) {
            *n = n.min(squared_distance(r, &chosen));
        }
        centroids.push(chosen);
    }
    centroids
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_variance(rows: &[Vec<f64>]) -> f64 {
    let n = rows.len() as f64;
    let width = rows[0].len();
    if width == 0 {
        return 0.0;
    }
    let total: f64 = (0..width)
        .map(|j| {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();
    total / width as f64
}

/// SplitMix64: small, fast, fully determined by its seed.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `0..n`, `n > 0`.
    fn below(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }
}
