//! Deterministic environment series engine.
//!
//! This module holds the numeric core: the seeded PRNG, the series data
//! model, the correlated generator/advancer pair and moving statistics.
//! Everything here is synchronous and free of I/O.

pub mod data;
pub mod generator;
pub mod prng;
pub mod stats;

// Re-export commonly used items
pub use data::{Metric, SeriesCollection, TimeSeries, TimeSeriesPoint};
pub use generator::{advance_environment_series, generate_environment_series, GeneratorConfig};
pub use prng::{create_prng, Prng};
pub use stats::{calculate_moving_stats, MovingStats};
