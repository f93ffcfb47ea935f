//! Air Quality Index severity categories and display colors.

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color returned for labels that do not name a category.
pub const FALLBACK_COLOR: &str = "#95a5a6";

/// AQI severity, ordered from safest to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitive,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Classify a reading. Inclusive upper bounds: 50, 100, 150, 200, 300.
    ///
    /// Negative, NaN and infinite readings are not physically meaningful and
    /// classify as [`AqiCategory::Good`].
    pub fn from_value(value: f64) -> Self {
        if !value.is_finite() || value < 0.0 {
            return AqiCategory::Good;
        }
        match value {
            v if v <= 50.0 => AqiCategory::Good,
            v if v <= 100.0 => AqiCategory::Moderate,
            v if v <= 150.0 => AqiCategory::UnhealthyForSensitive,
            v if v <= 200.0 => AqiCategory::Unhealthy,
            v if v <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    /// Kebab-case identifier, e.g. `"unhealthy-for-sensitive"`.
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "good",
            AqiCategory::Moderate => "moderate",
            AqiCategory::UnhealthyForSensitive => "unhealthy-for-sensitive",
            AqiCategory::Unhealthy => "unhealthy",
            AqiCategory::VeryUnhealthy => "very-unhealthy",
            AqiCategory::Hazardous => "hazardous",
        }
    }

    /// Hex display color.
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "#2ecc71",
            AqiCategory::Moderate => "#f1c40f",
            AqiCategory::UnhealthyForSensitive => "#e67e22",
            AqiCategory::Unhealthy => "#e74c3c",
            AqiCategory::VeryUnhealthy => "#8e44ad",
            AqiCategory::Hazardous => "#7e0023",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AqiCategory {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        AqiCategory::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| SimulationError::unknown_category(label))
    }
}

/// Anything a color can be looked up from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AqiLookup<'a> {
    /// A raw reading, classified first
    Value(f64),
    /// An already-known category
    Category(AqiCategory),
    /// A category label that may or may not be valid
    Label(&'a str),
}

impl From<f64> for AqiLookup<'_> {
    fn from(value: f64) -> Self {
        AqiLookup::Value(value)
    }
}

impl From<i32> for AqiLookup<'_> {
    fn from(value: i32) -> Self {
        AqiLookup::Value(f64::from(value))
    }
}

impl From<AqiCategory> for AqiLookup<'_> {
    fn from(category: AqiCategory) -> Self {
        AqiLookup::Category(category)
    }
}

impl<'a> From<&'a str> for AqiLookup<'a> {
    fn from(label: &'a str) -> Self {
        AqiLookup::Label(label)
    }
}

/// Classify an AQI reading.
pub fn get_aqi_category(value: f64) -> AqiCategory {
    AqiCategory::from_value(value)
}

/// Display color for a reading, a category, or a category label.
///
/// Unrecognized labels yield [`FALLBACK_COLOR`].
pub fn get_aqi_color<'a>(lookup: impl Into<AqiLookup<'a>>) -> &'static str {
    match lookup.into() {
        AqiLookup::Value(value) => AqiCategory::from_value(value).color(),
        AqiLookup::Category(category) => category.color(),
        AqiLookup::Label(label) => label
            .parse::<AqiCategory>()
            .map(AqiCategory::color)
            .unwrap_or(FALLBACK_COLOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(get_aqi_category(0.0), AqiCategory::Good);
        assert_eq!(get_aqi_category(50.0), AqiCategory::Good);
        assert_eq!(get_aqi_category(50.5), AqiCategory::Moderate);
        assert_eq!(get_aqi_category(51.0), AqiCategory::Moderate);
        assert_eq!(get_aqi_category(100.0), AqiCategory::Moderate);
        assert_eq!(get_aqi_category(150.0), AqiCategory::UnhealthyForSensitive);
        assert_eq!(get_aqi_category(200.0), AqiCategory::Unhealthy);
        assert_eq!(get_aqi_category(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(get_aqi_category(301.0), AqiCategory::Hazardous);
    }

    #[test]
    fn test_invalid_readings_are_good() {
        assert_eq!(get_aqi_category(-5.0), AqiCategory::Good);
        assert_eq!(get_aqi_category(f64::NAN), AqiCategory::Good);
        assert_eq!(get_aqi_category(f64::INFINITY), AqiCategory::Good);
        assert_eq!(get_aqi_category(f64::NEG_INFINITY), AqiCategory::Good);
    }

    #[test]
    fn test_colors() {
        assert_eq!(get_aqi_color(45.0), "#2ecc71");
        assert_eq!(get_aqi_color(45), "#2ecc71");
        assert_eq!(get_aqi_color("very-unhealthy"), "#8e44ad");
        assert_eq!(get_aqi_color(AqiCategory::Hazardous), "#7e0023");
        assert_eq!(get_aqi_color("unknown-category"), FALLBACK_COLOR);
        assert_eq!(get_aqi_color(""), FALLBACK_COLOR);
    }

    #[test]
    fn test_label_round_trip_and_serde() {
        for category in AqiCategory::ALL {
            assert_eq!(category.label().parse::<AqiCategory>().ok(), Some(category));
            let json = serde_json::to_string(&category).expect("Should serialize");
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
        assert!(matches!(
            "smoky".parse::<AqiCategory>(),
            Err(SimulationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_categories_are_ordered_by_severity() {
        assert!(AqiCategory::Good < AqiCategory::Moderate);
        assert!(AqiCategory::VeryUnhealthy < AqiCategory::Hazardous);
    }
}
