//! Correlated environment series generation and live advancement.
//!
//! Each metric is a smooth baseline (daily sinusoid plus a slow weekly drift)
//! with a mean-reverting residual on top. Every step draws one shared shock,
//! weighted by `correlation`, and one independent shock per metric, weighted
//! by `1 - correlation`; both are scaled by `noise`.

use crate::series::data::{Metric, SeriesCollection, TimeSeries, TimeSeriesPoint};
use crate::series::prng::Prng;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

/// Milliseconds in a day.
pub const DAY_MS: i64 = 86_400_000;

const WEEK_MS: i64 = 7 * DAY_MS;

/// Fraction of the previous residual carried into the next step.
pub(crate) const REVERSION: f64 = 0.8;

/// Parameters shared by the generator and the advancer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    /// Days of history held in the window
    pub window_days: u32,
    /// Samples per simulated day
    pub points_per_day: u32,
    /// Scale of the per-step perturbation, `>= 0`
    pub noise: f64,
    /// Share of the perturbation common to all metrics, in `[0, 1]`
    pub correlation: f64,
    /// Timestamp of the newest generated point (Unix milliseconds)
    pub start_timestamp: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window_days: crate::DEFAULT_WINDOW_DAYS,
            points_per_day: crate::DEFAULT_POINTS_PER_DAY,
            noise: crate::DEFAULT_NOISE,
            correlation: crate::DEFAULT_CORRELATION,
            start_timestamp: 0,
        }
    }
}

impl GeneratorConfig {
    /// Maximum number of points per series.
    pub fn window_size(&self) -> usize {
        self.window_days.max(1) as usize * self.points_per_day.max(1) as usize
    }

    /// Spacing between consecutive points in milliseconds.
    pub fn point_interval_ms(&self) -> i64 {
        let span = i64::from(self.window_days.max(1)) * DAY_MS;
        (span / self.window_size() as i64).max(1)
    }

    fn effective_noise(&self) -> f64 {
        if self.noise.is_finite() {
            self.noise.max(0.0)
        } else {
            0.0
        }
    }

    fn effective_correlation(&self) -> f64 {
        if self.correlation.is_finite() {
            self.correlation.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Shape of one metric's synthetic signal.
#[derive(Debug, Clone, Copy)]
struct Profile {
    base: f64,
    daily_amplitude: f64,
    daily_phase: f64,
    drift_amplitude: f64,
    shock_scale: f64,
    /// Direction in which the shared shock moves this metric
    shared_sign: f64,
    min: f64,
    max: f64,
}

impl Profile {
    fn for_metric(metric: Metric) -> Self {
        match metric {
            // coolest around midnight, warmest around noon
            Metric::Temperature => Self {
                base: 24.0,
                daily_amplitude: 3.0,
                daily_phase: -FRAC_PI_2,
                drift_amplitude: 0.8,
                shock_scale: 1.0,
                shared_sign: 1.0,
                min: -20.0,
                max: 60.0,
            },
            // humidity runs opposite to temperature
            Metric::Humidity => Self {
                base: 55.0,
                daily_amplitude: 10.0,
                daily_phase: FRAC_PI_2,
                drift_amplitude: 3.0,
                shock_scale: 4.0,
                shared_sign: -1.0,
                min: 0.0,
                max: 100.0,
            },
            Metric::AirQuality => Self {
                base: 40.0,
                daily_amplitude: 12.0,
                daily_phase: FRAC_PI_4,
                drift_amplitude: 6.0,
                shock_scale: 8.0,
                shared_sign: 1.0,
                min: 0.0,
                max: 500.0,
            },
        }
    }

    fn baseline(&self, timestamp: i64) -> f64 {
        let day_fraction = timestamp.rem_euclid(DAY_MS) as f64 / DAY_MS as f64;
        let week_fraction = timestamp.rem_euclid(WEEK_MS) as f64 / WEEK_MS as f64;
        self.base
            + self.daily_amplitude * (TAU * day_fraction + self.daily_phase).sin()
            + self.drift_amplitude * (TAU * week_fraction).sin()
    }

    fn next_residual(&self, previous: f64, shocks: &Shocks, index: usize) -> f64 {
        let shock = self.shared_sign * shocks.shared + shocks.independent[index];
        REVERSION * previous + self.shock_scale * shock
    }

    fn value_at(&self, timestamp: i64, residual: f64) -> f64 {
        (self.baseline(timestamp) + residual).clamp(self.min, self.max)
    }
}

/// Random perturbations for one time step.
struct Shocks {
    shared: f64,
    independent: [f64; 3],
}

impl Shocks {
    /// Draw order is fixed: shared first, then one per metric in
    /// `Metric::ALL` order.
    fn draw(prng: &mut Prng, config: &GeneratorConfig) -> Self {
        let noise = config.effective_noise();
        let correlation = config.effective_correlation();
        let shared = prng.next_signed() * correlation * noise;
        let mut independent = [0.0; 3];
        for slot in independent.iter_mut() {
            *slot = prng.next_signed() * (1.0 - correlation) * noise;
        }
        Self {
            shared,
            independent,
        }
    }
}

/// Build a full window of correlated series ending at `config.start_timestamp`.
///
/// The output is a pure function of the PRNG state and `config`: the same
/// seed and parameters always reproduce the same bits.
pub fn generate_environment_series(prng: &mut Prng, config: &GeneratorConfig) -> SeriesCollection {
    let n = config.window_size();
    let interval = config.point_interval_ms();
    let profiles = Metric::ALL.map(Profile::for_metric);

    let mut residuals = [0.0; 3];
    let mut columns: [Vec<TimeSeriesPoint>; 3] = Default::default();
    for column in columns.iter_mut() {
        column.reserve_exact(n);
    }

    for i in 0..n {
        let timestamp = config.start_timestamp - (n - 1 - i) as i64 * interval;
        let shocks = Shocks::draw(prng, config);
        for (k, profile) in profiles.iter().enumerate() {
            residuals[k] = profile.next_residual(residuals[k], &shocks, k);
            columns[k].push(TimeSeriesPoint::new(
                timestamp,
                profile.value_at(timestamp, residuals[k]),
            ));
        }
    }

    let [temperature, humidity, aqi] = columns;
    SeriesCollection {
        temperature: TimeSeries::from_points(temperature),
        humidity: TimeSeries::from_points(humidity),
        aqi: TimeSeries::from_points(aqi),
    }
}

/// Produce the next collection: one new point per series, one interval after
/// the current latest point, evicting the oldest when the window is full.
///
/// `current` is never modified. An empty collection starts at
/// `config.start_timestamp`.
pub fn advance_environment_series(
    current: &SeriesCollection,
    prng: &mut Prng,
    config: &GeneratorConfig,
) -> SeriesCollection {
    let timestamp = current
        .latest_timestamp()
        .map_or(config.start_timestamp, |latest| latest + config.point_interval_ms());
    let max_len = config.window_size();
    let shocks = Shocks::draw(prng, config);

    let [temperature, humidity, aqi] = Metric::ALL.map(|metric| {
        let k = metric_index(metric);
        let profile = Profile::for_metric(metric);
        let series = current.get(metric);
        let previous = series
            .latest()
            .map_or(0.0, |p| p.value - profile.baseline(p.timestamp));
        let residual = profile.next_residual(previous, &shocks, k);
        series.with_appended(
            TimeSeriesPoint::new(timestamp, profile.value_at(timestamp, residual)),
            max_len,
        )
    });

    SeriesCollection {
        temperature,
        humidity,
        aqi,
    }
}

/// Noise-free signal of `metric` at `timestamp`.
#[cfg(test)]
pub(crate) fn metric_baseline(metric: Metric, timestamp: i64) -> f64 {
    Profile::for_metric(metric).baseline(timestamp)
}

fn metric_index(metric: Metric) -> usize {
    match metric {
        Metric::Temperature => 0,
        Metric::Humidity => 1,
        Metric::AirQuality => 2,
    }
}
