//! Presentation-facing views over simulated series.
//!
//! Dashboard components consume these read-only structures; nothing in this
//! module mutates a [`SeriesCollection`](crate::series::SeriesCollection).

pub mod aqi;
pub mod format;

// Re-export commonly used items
pub use aqi::{get_aqi_category, get_aqi_color, AqiCategory, AqiLookup, FALLBACK_COLOR};
pub use format::{
    format_environment, format_series, AirQualityView, EnvironmentView, FormattedSeries,
    MetricSpec, SeriesPointWithBands,
};
