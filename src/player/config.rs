//! Simulation configuration.

use crate::error::{Result, SimulationError};
use crate::series::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Upper bound accepted for `noise`.
pub const MAX_NOISE: f64 = 5.0;

/// Largest series window a configuration may request.
pub const MAX_WINDOW_POINTS: usize = 1_000_000;

/// Configuration for a simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed string driving the PRNG
    pub seed: String,
    /// Days of history kept in the window
    pub window_days: u32,
    /// Samples per simulated day
    pub points_per_day: u32,
    /// Per-step perturbation scale, clamped to `[0, 5]`
    pub noise: f64,
    /// Shared share of the perturbation, clamped to `[0, 1]`
    pub correlation: f64,
    /// Wall-clock cadence of live advancement in milliseconds
    pub update_interval_ms: u64,
    /// Fixed timestamp for the newest generated point; `None` uses the clock
    pub start_timestamp: Option<i64>,
    /// Whether a new player starts in the playing state
    pub autoplay: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: crate::DEFAULT_SEED.to_string(),
            window_days: crate::DEFAULT_WINDOW_DAYS,
            points_per_day: crate::DEFAULT_POINTS_PER_DAY,
            noise: crate::DEFAULT_NOISE,
            correlation: crate::DEFAULT_CORRELATION,
            update_interval_ms: crate::DEFAULT_UPDATE_INTERVAL_MS,
            start_timestamp: None,
            autoplay: true,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with a custom seed and default parameters.
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: SimulationConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config.normalized())
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Set the window length in days and the sampling density.
    pub fn with_window(mut self, window_days: u32, points_per_day: u32) -> Self {
        self.window_days = window_days;
        self.points_per_day = points_per_day;
        self
    }

    /// Set the noise scale.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Set the correlation strength.
    pub fn with_correlation(mut self, correlation: f64) -> Self {
        self.correlation = correlation;
        self
    }

    /// Set the live update interval in milliseconds.
    pub fn with_update_interval_ms(mut self, update_interval_ms: u64) -> Self {
        self.update_interval_ms = update_interval_ms;
        self
    }

    /// Pin the timestamp of the newest generated point.
    pub fn with_start_timestamp(mut self, start_timestamp: Option<i64>) -> Self {
        self.start_timestamp = start_timestamp;
        self
    }

    /// Start playing on construction or not.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Number of points each series holds.
    pub fn window_size(&self) -> usize {
        self.window_days.max(1) as usize * self.points_per_day.max(1) as usize
    }

    /// Update interval as a `Duration`.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1))
    }

    /// Generator parameters for a window ending at `start_timestamp`.
    pub fn generator_config(&self, start_timestamp: i64) -> GeneratorConfig {
        GeneratorConfig {
            window_days: self.window_days.max(1),
            points_per_day: self.points_per_day.max(1),
            noise: self.noise,
            correlation: self.correlation,
            start_timestamp,
        }
    }

    /// Reject configurations that cannot be normalized into something usable.
    pub fn validate(&self) -> Result<()> {
        let points = u64::from(self.window_days.max(1)) * u64::from(self.points_per_day.max(1));
        if points > MAX_WINDOW_POINTS as u64 {
            return Err(SimulationError::config_error(format!(
                "window of {} days x {} points per day exceeds {} points",
                self.window_days, self.points_per_day, MAX_WINDOW_POINTS
            )));
        }
        Ok(())
    }

    /// Clamp every field into its valid domain.
    pub fn normalized(mut self) -> Self {
        let defaults = SimulationConfig::default();
        self.seed = normalize_seed(&self.seed);
        self.window_days = self.window_days.max(1);
        self.points_per_day = self.points_per_day.max(1);
        self.noise = clamp_noise(self.noise, defaults.noise);
        self.correlation = clamp_correlation(self.correlation, defaults.correlation);
        self.update_interval_ms = self.update_interval_ms.max(1);
        self
    }
}

/// Blank seeds fall back to [`DEFAULT_SEED`](crate::DEFAULT_SEED).
pub fn normalize_seed(seed: &str) -> String {
    if seed.trim().is_empty() {
        warn!("Empty seed, using default seed '{}'", crate::DEFAULT_SEED);
        crate::DEFAULT_SEED.to_string()
    } else {
        seed.to_string()
    }
}

/// Clamp noise into `[0, MAX_NOISE]`; non-finite input keeps `previous`.
pub fn clamp_noise(value: f64, previous: f64) -> f64 {
    clamp_or_keep("noise", value, previous, 0.0, MAX_NOISE)
}

/// Clamp correlation into `[0, 1]`; non-finite input keeps `previous`.
pub fn clamp_correlation(value: f64, previous: f64) -> f64 {
    clamp_or_keep("correlation", value, previous, 0.0, 1.0)
}

/// Round a millisecond interval; non-finite or non-positive input keeps `previous`.
pub fn normalize_interval(value_ms: f64, previous_ms: u64) -> u64 {
    if !value_ms.is_finite() || value_ms <= 0.0 {
        warn!(
            "Invalid update interval {}, keeping {}ms",
            value_ms, previous_ms
        );
        return previous_ms;
    }
    (value_ms.round() as u64).max(1)
}

fn clamp_or_keep(name: &str, value: f64, previous: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        warn!("Non-finite {} ignored, keeping {}", name, previous);
        return previous;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} {} clamped to {}", name, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.window_days, 30);
        assert_eq!(config.points_per_day, 24);
        assert_eq!(config.noise, 0.4);
        assert_eq!(config.correlation, 0.3);
        assert_eq!(config.update_interval(), Duration::from_millis(5000));
        assert_eq!(config.window_size(), 720);
        assert!(config.autoplay);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SimulationConfig::new("silo-3")
            .with_window(7, 48)
            .with_noise(1.5)
            .with_correlation(0.9)
            .with_update_interval_ms(250)
            .with_start_timestamp(Some(42))
            .with_autoplay(false);

        assert_eq!(config.seed, "silo-3");
        assert_eq!(config.window_size(), 336);
        assert_eq!(config.update_interval_ms, 250);
        let generator = config.generator_config(42);
        assert_eq!(generator.start_timestamp, 42);
        assert_eq!(generator.noise, 1.5);
    }

    #[test]
    fn test_normalization() {
        let config = SimulationConfig::new("   ")
            .with_window(0, 0)
            .with_noise(12.0)
            .with_correlation(f64::NAN)
            .with_update_interval_ms(0)
            .normalized();

        assert_eq!(config.seed, crate::DEFAULT_SEED);
        assert_eq!(config.window_size(), 1);
        assert_eq!(config.noise, MAX_NOISE);
        assert_eq!(config.correlation, crate::DEFAULT_CORRELATION);
        assert_eq!(config.update_interval_ms, 1);
    }

    #[test]
    fn test_clamp_helpers() {
        assert_eq!(clamp_noise(-1.0, 0.4), 0.0);
        assert_eq!(clamp_noise(f64::INFINITY, 0.4), 0.4);
        assert_eq!(clamp_correlation(1.7, 0.3), 1.0);
        assert_eq!(clamp_correlation(0.5, 0.3), 0.5);
        assert_eq!(normalize_interval(-10.0, 800), 800);
        assert_eq!(normalize_interval(f64::NAN, 800), 800);
        assert_eq!(normalize_interval(1200.4, 800), 1200);
        assert_eq!(normalize_seed(" silo "), " silo ");
        assert_eq!(normalize_seed("\t\n"), crate::DEFAULT_SEED);
    }

    #[test]
    fn test_oversized_window_rejected() {
        let config = SimulationConfig::default().with_window(u32::MAX, 24);
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "seed": "silo-9", "noise": 0.8 }"#).expect("Should parse");
        assert_eq!(config.seed, "silo-9");
        assert_eq!(config.noise, 0.8);
        assert_eq!(config.points_per_day, 24);
        assert_eq!(config.start_timestamp, None);
    }
}
