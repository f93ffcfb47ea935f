//! Windowed mean and standard deviation.

use crate::series::data::TimeSeries;
use serde::{Deserialize, Serialize};

/// Per-point moving statistics, co-indexed with the input series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovingStats {
    pub average: Vec<f64>,
    pub std_dev: Vec<f64>,
}

impl MovingStats {
    pub fn len(&self) -> usize {
        self.average.len()
    }

    pub fn is_empty(&self) -> bool {
        self.average.is_empty()
    }
}

/// Moving mean and population standard deviation over a trailing window.
///
/// For index `i` the window covers `[max(0, i - window_size + 1), i]`, so the
/// first points use a shorter, growing window. A `window_size` of zero is
/// treated as one.
pub fn calculate_moving_stats(series: &TimeSeries, window_size: usize) -> MovingStats {
    let values = series.values();
    moving_stats_of(&values, window_size)
}

/// Same as [`calculate_moving_stats`], accepting a signed window size where
/// anything `<= 0` falls back to one.
pub fn calculate_moving_stats_signed(series: &TimeSeries, window_size: i64) -> MovingStats {
    let window_size = usize::try_from(window_size).unwrap_or(0);
    calculate_moving_stats(series, window_size)
}

/// Moving statistics over a raw slice of values.
///
/// Runs in a single pass: running sums are kept over the sliding window,
/// shifted by the first value so constant inputs give an exact zero spread.
/// Non-finite values yield `NaN` statistics while they are inside the window.
pub fn moving_stats_of(values: &[f64], window_size: usize) -> MovingStats {
    let window_size = window_size.max(1);
    let mut stats = MovingStats {
        average: Vec::with_capacity(values.len()),
        std_dev: Vec::with_capacity(values.len()),
    };
    let Some(&shift) = values.iter().find(|v| v.is_finite()) else {
        stats.average.resize(values.len(), f64::NAN);
        stats.std_dev.resize(values.len(), f64::NAN);
        return stats;
    };

    let mut window = RunningSums::default();
    for (i, &value) in values.iter().enumerate() {
        window.add(value - shift);
        if i >= window_size {
            window.remove(values[i - window_size] - shift);
        }
        let (mean, std_dev) = window.summary();
        stats.average.push(shift + mean);
        stats.std_dev.push(std_dev);
    }

    stats
}

/// Sum and sum of squares of the finite values in a window.
#[derive(Default)]
struct RunningSums {
    count: usize,
    sum: f64,
    sum_sq: f64,
    non_finite: usize,
}

impl RunningSums {
    fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.count += 1;
            self.sum += value;
            self.sum_sq += value * value;
        } else {
            self.non_finite += 1;
        }
    }

    fn remove(&mut self, value: f64) {
        if value.is_finite() {
            self.count -= 1;
            self.sum -= value;
            self.sum_sq -= value * value;
        } else {
            self.non_finite -= 1;
        }
    }

    fn summary(&self) -> (f64, f64) {
        if self.non_finite > 0 || self.count == 0 {
            return (f64::NAN, f64::NAN);
        }
        let count = self.count as f64;
        let mean = self.sum / count;
        let variance = (self.sum_sq / count - mean * mean).max(0.0);
        (mean, variance.sqrt())
    }
}

/// Mean and population standard deviation of `values`; `(0.0, 0.0)` when empty.
///
/// Two passes keep the variance exact for constant inputs.
pub fn summarize(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    (mean, variance.sqrt())
}
