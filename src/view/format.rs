//! Display formatting for simulated series.
//!
//! Everything here is a pure read path over a [`SeriesCollection`]: moving
//! statistics, mean ± 2σ bands clamped to each metric's physical bounds,
//! point labels and summary figures.

use crate::series::data::{Metric, SeriesCollection, TimeSeries};
use crate::series::stats::{calculate_moving_stats, summarize};
use crate::view::aqi::AqiCategory;
use chrono::DateTime;
use serde::Serialize;

/// Standard deviations between the moving average and each band.
const BAND_WIDTH: f64 = 2.0;

/// How a metric is labelled and bounded on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSpec {
    pub metric: Metric,
    pub unit: &'static str,
    /// Decimal places in formatted values
    pub precision: usize,
    /// Physical `[min, max]` domain bands are clamped to
    pub bounds: Option<(f64, f64)>,
}

impl MetricSpec {
    pub const TEMPERATURE: MetricSpec = MetricSpec {
        metric: Metric::Temperature,
        unit: "°C",
        precision: 1,
        bounds: None,
    };

    pub const HUMIDITY: MetricSpec = MetricSpec {
        metric: Metric::Humidity,
        unit: "%",
        precision: 0,
        bounds: Some((0.0, 100.0)),
    };

    pub const AIR_QUALITY: MetricSpec = MetricSpec {
        metric: Metric::AirQuality,
        unit: "AQI",
        precision: 0,
        bounds: Some((0.0, 500.0)),
    };

    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Temperature => Self::TEMPERATURE,
            Metric::Humidity => Self::HUMIDITY,
            Metric::AirQuality => Self::AIR_QUALITY,
        }
    }

    /// Override the clamping domain.
    ///
    /// Reversed bounds are swapped; bounds with a `NaN` end are dropped.
    pub fn with_bounds(mut self, bounds: Option<(f64, f64)>) -> Self {
        self.bounds = bounds
            .filter(|(min, max)| !min.is_nan() && !max.is_nan())
            .map(|(min, max)| if min <= max { (min, max) } else { (max, min) });
        self
    }

    /// Format a value with this metric's precision and unit, e.g. `"24.3 °C"`.
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.*} {}", self.precision, value, self.unit)
    }

    fn clamp(&self, value: f64) -> f64 {
        match self.bounds {
            // min/max instead of f64::clamp, which panics on bad bounds
            Some((min, max)) => value.max(min).min(max),
            None => value,
        }
    }
}

/// One display point with its moving statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPointWithBands {
    pub timestamp: i64,
    /// `dd/mm HH:MM` in UTC
    pub label: String,
    pub value: f64,
    pub formatted_value: String,
    pub average: f64,
    pub std_dev: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

/// Read-only display view of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedSeries {
    pub metric: Metric,
    pub points: Vec<SeriesPointWithBands>,
    pub latest: Option<f64>,
    pub average: f64,
    pub std_dev: f64,
    pub unit: &'static str,
}

impl FormattedSeries {
    /// Latest value formatted with the metric's unit, or `"--"` when empty.
    pub fn latest_formatted(&self) -> String {
        self.latest
            .map(|value| MetricSpec::for_metric(self.metric).format_value(value))
            .unwrap_or_else(|| "--".to_string())
    }
}

/// Air quality series plus the category of its latest reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityView {
    #[serde(flatten)]
    pub series: FormattedSeries,
    pub category: AqiCategory,
    pub color: &'static str,
}

/// Formatted views of all three metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentView {
    pub temperature: FormattedSeries,
    pub humidity: FormattedSeries,
    pub air_quality: AirQualityView,
}

/// Human-readable label for a timestamp.
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%d/%m %H:%M").to_string())
        .unwrap_or_else(|| "--/-- --:--".to_string())
}

/// Format one series with moving statistics over `window_size` points.
pub fn format_series(series: &TimeSeries, display: &MetricSpec, window_size: usize) -> FormattedSeries {
    let stats = calculate_moving_stats(series, window_size);
    let points = series
        .iter()
        .zip(stats.average.iter().zip(stats.std_dev.iter()))
        .map(|(point, (&average, &std_dev))| SeriesPointWithBands {
            timestamp: point.timestamp,
            label: format_timestamp(point.timestamp),
            value: point.value,
            formatted_value: display.format_value(point.value),
            average,
            std_dev,
            upper_band: display.clamp(average + BAND_WIDTH * std_dev),
            lower_band: display.clamp(average - BAND_WIDTH * std_dev),
        })
        .collect();

    let (average, std_dev) = summarize(&series.values());
    FormattedSeries {
        metric: display.metric,
        points,
        latest: series.latest().map(|p| p.value),
        average,
        std_dev,
        unit: display.unit,
    }
}

/// Format every metric in `collection`.
pub fn format_environment(collection: &SeriesCollection, window_size: usize) -> EnvironmentView {
    let temperature = format_series(&collection.temperature, &MetricSpec::TEMPERATURE, window_size);
    let humidity = format_series(&collection.humidity, &MetricSpec::HUMIDITY, window_size);
    let series = format_series(&collection.aqi, &MetricSpec::AIR_QUALITY, window_size);
    let category = AqiCategory::from_value(series.latest.unwrap_or(0.0));

    EnvironmentView {
        temperature,
        humidity,
        air_quality: AirQualityView {
            series,
            category,
            color: category.color(),
        },
    }
}
