//! Data structures for simulated environment series.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single reading at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Reading value in the metric's unit
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Readings ordered by strictly increasing timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<TimeSeriesPoint>,
}

impl TimeSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from `points`, sorting them by timestamp.
    ///
    /// When several points share a timestamp only the first is kept, so the
    /// result is always strictly increasing.
    pub fn from_points(mut points: Vec<TimeSeriesPoint>) -> Self {
        if !points.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
            points.sort_by_key(|p| p.timestamp);
            points.dedup_by_key(|p| p.timestamp);
        }
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSeriesPoint> {
        self.points.iter()
    }

    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    /// Values in timestamp order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Return a new series with `point` appended, keeping at most `max_len`
    /// of the most recent points. `self` is left untouched.
    pub fn with_appended(&self, point: TimeSeriesPoint, max_len: usize) -> Self {
        let max_len = max_len.max(1);
        let keep = self.points.len().min(max_len - 1);
        let skip = self.points.len() - keep;
        let mut points = Vec::with_capacity(keep + 1);
        points.extend_from_slice(&self.points[skip..]);
        points.push(point);
        Self { points }
    }
}

impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<TimeSeriesPoint>::deserialize(deserializer).map(Self::from_points)
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a TimeSeriesPoint;
    type IntoIter = std::slice::Iter<'a, TimeSeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// The simulated silo metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    AirQuality,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::AirQuality];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::AirQuality => "air quality",
        };
        f.write_str(name)
    }
}

/// Three co-indexed series sharing timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesCollection {
    /// Temperature in degrees Celsius
    pub temperature: TimeSeries,
    /// Relative humidity in percent
    pub humidity: TimeSeries,
    /// Air quality index (unitless)
    pub aqi: TimeSeries,
}

impl SeriesCollection {
    pub fn get(&self, metric: Metric) -> &TimeSeries {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::AirQuality => &self.aqi,
        }
    }

    /// Number of points per series.
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Timestamp of the most recent point.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.temperature.latest().map(|p| p.timestamp)
    }

    /// Whether the three series have equal length and aligned timestamps.
    pub fn is_aligned(&self) -> bool {
        let len = self.temperature.len();
        if self.humidity.len() != len || self.aqi.len() != len {
            return false;
        }
        self.temperature
            .iter()
            .zip(self.humidity.iter())
            .zip(self.aqi.iter())
            .all(|((t, h), a)| t.timestamp == h.timestamp && t.timestamp == a.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimeSeriesPoint::new(i as i64 * 10, *v))
                .collect(),
        )
    }

    #[test]
    fn test_with_appended_evicts_oldest() {
        let original = series(&[1.0, 2.0, 3.0]);
        let next = original.with_appended(TimeSeriesPoint::new(30, 4.0), 3);

        assert_eq!(next.values(), vec![2.0, 3.0, 4.0]);
        assert_eq!(original.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_with_appended_grows_below_limit() {
        let original = series(&[1.0]);
        let next = original.with_appended(TimeSeriesPoint::new(10, 2.0), 5);
        assert_eq!(next.len(), 2);
        assert_eq!(next.latest().map(|p| p.timestamp), Some(10));
    }

    #[test]
    fn test_from_points_orders_and_deduplicates() {
        let series = TimeSeries::from_points(vec![
            TimeSeriesPoint::new(20, 3.0),
            TimeSeriesPoint::new(0, 1.0),
            TimeSeriesPoint::new(10, 2.0),
            TimeSeriesPoint::new(10, 9.0),
        ]);

        let timestamps: Vec<i64> = series.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![0, 10, 20]);
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_deserialized_series_is_ordered() {
        let json = r#"[{"timestamp":5,"value":2.0},{"timestamp":1,"value":1.0}]"#;
        let series: TimeSeries = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(series.latest().map(|p| p.timestamp), Some(5));
        assert_eq!(
            serde_json::to_string(&series).expect("Should serialize"),
            r#"[{"timestamp":1,"value":1.0},{"timestamp":5,"value":2.0}]"#
        );
    }

    #[test]
    fn test_alignment_check() {
        let mut collection = SeriesCollection {
            temperature: series(&[1.0, 2.0]),
            humidity: series(&[3.0, 4.0]),
            aqi: series(&[5.0, 6.0]),
        };
        assert!(collection.is_aligned());
        assert_eq!(collection.get(Metric::Humidity).values(), vec![3.0, 4.0]);

        collection.aqi = series(&[5.0]);
        assert!(!collection.is_aligned());
    }

    #[test]
    fn test_series_serializes_as_array() {
        let json = serde_json::to_string(&series(&[1.5])).expect("Should serialize");
        assert_eq!(json, r#"[{"timestamp":0,"value":1.5}]"#);
    }
}
