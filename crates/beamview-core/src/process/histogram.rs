use ndarray::Array2;

use crate::consts::{HISTOGRAM_EDGES, HISTOGRAM_FULL_SCALE, HISTOGRAM_LOG_OFFSET};

/// Bin counts over log-spaced edges. Bin `i` covers `edges[i]..edges[i + 1]`,
/// the last bin also includes its upper edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// Edges as fractions of full scale.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    /// Samples below the first edge (including zero).
    pub below: u64,
    /// Samples above full scale.
    pub above: u64,
}

impl Histogram {
    /// Samples that landed in a bin.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(lower edge, upper edge, count)` of the fullest bin.
    pub fn peak(&self) -> Option<(f64, f64, u64)> {
        let (i, &count) = self
            .counts
            .iter()
            .enumerate()
            .max_by_key(|&(i, &c)| (c, std::cmp::Reverse(i)))?;
        (count > 0).then(|| (self.edges[i], self.edges[i + 1], count))
    }

    pub fn log_edges(&self) -> Vec<f64> {
        self.edges.iter().map(|e| e.log10()).collect()
    }

    /// `log10(count + 0.5)` per bin.
    pub fn log_counts(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|&c| (c as f64 + HISTOGRAM_LOG_OFFSET).log10())
            .collect()
    }
}

/// Histogram of sample values normalized to full scale, with edges spaced
/// evenly in log10 from one count up to full scale.
#[derive(Clone, Debug)]
pub struct LogHistogram {
    edges: Vec<f64>,
    full_scale: f64,
}

impl LogHistogram {
    /// `edge_count` is clamped to at least 2; a non-positive `full_scale`
    /// falls back to the 16-bit range.
    pub fn new(edge_count: usize, full_scale: f64) -> Self {
        let full_scale = if full_scale > 1.0 && full_scale.is_finite() {
            full_scale
        } else {
            HISTOGRAM_FULL_SCALE
        };
        let n = edge_count.max(2);
        let lo = (1.0 / full_scale).log10();
        let step = -lo / (n - 1) as f64;

        let mut edges: Vec<f64> = (0..n).map(|i| 10f64.powf(lo + step * i as f64)).collect();
        edges[0] = 1.0 / full_scale;
        edges[n - 1] = 1.0;
        Self { edges, full_scale }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn full_scale(&self) -> f64 {
        self.full_scale
    }

    /// Bin every finite sample; NaN samples are ignored.
    pub fn compute(&self, data: &Array2<f64>) -> Histogram {
        let mut counts = vec![0u64; self.bins()];
        let mut below = 0;
        let mut above = 0;
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];

        for &sample in data.iter() {
            let v = sample / self.full_scale;
            if v.is_nan() {
                continue;
            }
            if v < first {
                below += 1;
            } else if v > last {
                above += 1;
            } else {
                let bin = (self.edges.partition_point(|&e| e <= v) - 1).min(counts.len() - 1);
                counts[bin] += 1;
            }
        }

        Histogram {
            edges: self.edges.clone(),
            counts,
            below,
            above,
        }
    }
}

impl Default for LogHistogram {
    fn default() -> Self {
        Self::new(HISTOGRAM_EDGES, HISTOGRAM_FULL_SCALE)
    }
}
