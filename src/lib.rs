//! # GrãoSeguro - Silo Environment Simulator
//!
//! Deterministic mock telemetry for the GrãoSeguro silo monitoring dashboard.
//! A string seed drives three correlated series (temperature, relative
//! humidity and air quality) that can be advanced live on a timer and
//! formatted with moving-average confidence bands for charting.
//!
//! ## Features
//!
//! - **Reproducible series**: the same seed and parameters always yield the same bits
//! - **Sliding window**: live advancement appends one point and evicts the oldest
//! - **Statistical bands**: moving mean ± 2σ, clamped to physical bounds
//! - **AQI classification**: severity categories and display colors
//! - **Player**: play/pause/seed/noise/correlation/interval controls with change notifications
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grao_seguro::{Player, SimulationConfig};
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let player = Player::new(SimulationConfig::new("silo-north"))?;
//!     let mut updates = player.updates();
//!
//!     while let Some(snapshot) = updates.next().await {
//!         println!("{} points after {} ticks", snapshot.collection.len(), snapshot.ticks);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod player;
pub mod series;
pub mod view;

// Re-export public API
pub use error::{Result, SimulationError};
pub use player::{PlaybackState, Player, PlayerSnapshot, SimulationConfig};
pub use series::{
    advance_environment_series, calculate_moving_stats, create_prng, generate_environment_series,
    GeneratorConfig, Metric, MovingStats, Prng, SeriesCollection, TimeSeries, TimeSeriesPoint,
};
pub use view::{
    format_environment, format_series, get_aqi_category, get_aqi_color, AqiCategory,
    EnvironmentView, FormattedSeries, MetricSpec, SeriesPointWithBands,
};

/// Seed used when none (or a blank one) is given
pub const DEFAULT_SEED: &str = "graoseguro";

/// Default days of history per series
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Default samples per simulated day
pub const DEFAULT_POINTS_PER_DAY: u32 = 24;

/// Default perturbation scale
pub const DEFAULT_NOISE: f64 = 0.4;

/// Default shared share of the perturbation
pub const DEFAULT_CORRELATION: f64 = 0.3;

/// Default live update interval in milliseconds
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 5000;
