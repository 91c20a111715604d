//! Descriptive statistics: pure functions over `f64` slices.
//!
//! Means and variances use a running (Welford) accumulator: numerically
//! stable, and the mean of N identical values is exactly that value.
//! Quantiles use linear interpolation between closest ranks.

use serde::{Deserialize, Serialize};

/// Single-pass accumulator for count, mean, variance, min and max.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (n − 1). Zero for fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Sample standard deviation (n − 1). Zero for fewer than two values.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    values.iter().copied().collect::<RunningStats>().mean()
}

/// Sample standard deviation, 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    values.iter().copied().collect::<RunningStats>().std_dev()
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile `q` in [0, 1] of already-sorted values (linear interpolation).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Median, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted_copy(values), 0.5)
}

/// First quartile, median and third quartile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        Some(Self {
            q1: quantile_sorted(&sorted, 0.25)?,
            median: quantile_sorted(&sorted, 0.5)?,
            q3: quantile_sorted(&sorted, 0.75)?,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Pearson correlation coefficient.
///
/// `None` when the slices differ in length, hold fewer than two points, or
/// either side has zero variance. Symmetric in its arguments.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// One histogram bucket covering `[lower, upper)` (the last bucket is closed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Fixed-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// `bins` equal-width buckets spanning the data's min..max.
    ///
    /// `None` for no values or zero bins. Constant data gets a single
    /// unit-wide bucket centred on the value.
    pub fn uniform(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let stats: RunningStats = values.iter().copied().collect();
        let (min, max) = (stats.min()?, stats.max()?);
        if max <= min {
            return Some(Self {
                bins: vec![HistogramBin {
                    lower: min - 0.5,
                    upper: min + 0.5,
                    count: values.len(),
                }],
            });
        }
        Some(Self::build(values, min, (max - min) / bins as f64, bins, true))
    }

    /// `bins` buckets with geometrically growing widths spanning the positive
    /// values' min..max. Non-positive values are not counted.
    ///
    /// `None` for zero bins or no positive values. Constant data gets a
    /// single bucket from 0.9x to 1.1x the value.
    pub fn log_spaced(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
        let stats: RunningStats = positive.iter().copied().collect();
        let (min, max) = (stats.min()?, stats.max()?);
        if max <= min {
            return Some(Self {
                bins: vec![HistogramBin {
                    lower: min * 0.9,
                    upper: min * 1.1,
                    count: positive.len(),
                }],
            });
        }
        let (log_min, log_max) = (min.ln(), max.ln());
        let step = (log_max - log_min) / bins as f64;
        let logs: Vec<f64> = positive.iter().map(|v| v.ln()).collect();
        let linear = Self::build(&logs, log_min, step, bins, true);
        let bins = linear
            .bins
            .into_iter()
            .enumerate()
            .map(|(i, b)| HistogramBin {
                lower: if i == 0 { min } else { b.lower.exp() },
                upper: if i + 1 == bins { max } else { b.upper.exp() },
                count: b.count,
            })
            .collect();
        Some(Self { bins })
    }

    /// `bins` buckets of `width` starting at `start`. Values outside the
    /// covered range are ignored; a value equal to the upper edge lands in the
    /// last bucket.
    pub fn with_edges(values: &[f64], start: f64, width: f64, bins: usize) -> Self {
        Self::build(values, start, width, bins, false)
    }

    /// `clamp_all` puts every value in a bucket; used when the edges were
    /// derived from the data itself and rounding may leave the max past `end`.
    fn build(values: &[f64], start: f64, width: f64, bins: usize, clamp_all: bool) -> Self {
        let mut counts = vec![0usize; bins];
        let end = start + width * bins as f64;
        if width > 0.0 && bins > 0 {
            for &v in values {
                if !clamp_all && (v < start || v > end) {
                    continue;
                }
                // Epsilon keeps e.g. 4.3 / 0.1 = 42.999… in bucket 43.
                let idx = (((v - start) / width) + 1e-9).floor() as usize;
                counts[idx.min(bins - 1)] += 1;
            }
        }
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: start + width * i as f64,
                upper: start + width * (i + 1) as f64,
                count,
            })
            .collect();
        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}
