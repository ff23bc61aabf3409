use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Place identification shared by readings and geocoding results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
}

/// Latitude/longitude pair, fixed for the lifetime of one search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One provider's normalized current-conditions report.
///
/// A reading is only ever constructed fully populated; adapters that cannot
/// fill every field fail instead of returning a partial reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    pub source: ProviderId,
    pub condition: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub icon_url: String,
    pub wind_speed_kph: f64,
    pub wind_direction_deg: f64,
    pub location: Place,
}

/// Current conditions from the orchestrated pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: Place,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub cloud_cover_pct: u8,
    pub wind_speed_mps: f64,
    pub condition: String,
    pub description: String,
}

/// One timed forecast sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub description: String,
}

/// Air-pollution snapshot for the searched coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQuality {
    /// Ordinal index, 1 (good) through 5 (very poor).
    pub aqi: u8,
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub pm2_5: f64,
}

impl AirQuality {
    pub fn level(&self) -> AqiLevel {
        AqiLevel::from_index(self.aqi)
    }
}

/// Human-readable label for the 1-5 air quality index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AqiLevel {
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            5 => AqiLevel::VeryPoor,
            _ => AqiLevel::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
            AqiLevel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad sky/precipitation category behind a provider condition string.
///
/// The mapping is total: any string outside the known condition families
/// lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCategory {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Drizzle,
    Fog,
    Other,
}

impl ConditionCategory {
    pub fn from_condition(condition: &str) -> Self {
        match condition.to_lowercase().as_str() {
            "clear" => ConditionCategory::Clear,
            "clouds" => ConditionCategory::Clouds,
            "rain" => ConditionCategory::Rain,
            "snow" => ConditionCategory::Snow,
            "thunderstorm" => ConditionCategory::Thunderstorm,
            "drizzle" => ConditionCategory::Drizzle,
            "mist" | "fog" => ConditionCategory::Fog,
            _ => ConditionCategory::Other,
        }
    }

    /// Search phrase used when looking up a backdrop photo.
    pub fn imagery_query(self) -> &'static str {
        match self {
            ConditionCategory::Clear => "sunny sky landscape",
            ConditionCategory::Clouds => "cloudy sky landscape",
            ConditionCategory::Rain => "rainy weather landscape",
            ConditionCategory::Snow => "snowy landscape",
            ConditionCategory::Thunderstorm => "thunderstorm landscape",
            ConditionCategory::Drizzle => "rainy city landscape",
            ConditionCategory::Fog => "foggy landscape",
            ConditionCategory::Other => "weather landscape",
        }
    }

    /// Fixed backdrop used when no imagery credential is configured or the
    /// lookup fails.
    pub fn default_background_url(self) -> &'static str {
        match self {
            ConditionCategory::Clear => {
                "https://images.unsplash.com/photo-1504608524841-42fe6f032b4b?ixlib=rb-1.2.1&auto=format&fit=crop&w=1920&q=80"
            }
            ConditionCategory::Clouds => {
                "https://images.unsplash.com/photo-1501630834273-4b5604d2ee31?ixlib=rb-1.2.1&auto=format&fit=crop&w=1920&q=80"
            }
            ConditionCategory::Rain
            | ConditionCategory::Drizzle
            | ConditionCategory::Thunderstorm => {
                "https://images.unsplash.com/photo-1501691223387-dd0506c89ac8?ixlib=rb-1.2.1&auto=format&fit=crop&w=1920&q=80"
            }
            ConditionCategory::Snow => {
                "https://images.unsplash.com/photo-1483664852095-d6cc6870702d?ixlib=rb-1.2.1&auto=format&fit=crop&w=1920&q=80"
            }
            ConditionCategory::Fog | ConditionCategory::Other => {
                "https://images.unsplash.com/photo-1504608524841-42fe6f032b4b?ixlib=rb-1.2.1&auto=format&fit=crop&w=1920&q=80"
            }
        }
    }
}

/// Wind speed conversion for adapters whose upstream reports m/s.
pub fn mps_to_kph(mps: f64) -> f64 {
    mps * 3.6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mps_to_kph_is_exact_for_whole_speeds() {
        assert_eq!(mps_to_kph(10.0), 36.0);
        assert_eq!(mps_to_kph(0.0), 0.0);
    }

    #[test]
    fn condition_category_is_total() {
        assert_eq!(ConditionCategory::from_condition("Clear"), ConditionCategory::Clear);
        assert_eq!(ConditionCategory::from_condition("MIST"), ConditionCategory::Fog);
        assert_eq!(ConditionCategory::from_condition("fog"), ConditionCategory::Fog);
        assert_eq!(
            ConditionCategory::from_condition("Patchy volcanic ash"),
            ConditionCategory::Other
        );
        assert_eq!(ConditionCategory::from_condition(""), ConditionCategory::Other);
    }

    #[test]
    fn unknown_category_still_has_imagery_fallbacks() {
        let other = ConditionCategory::Other;
        assert!(!other.imagery_query().is_empty());
        assert!(other.default_background_url().starts_with("https://"));
    }

    #[test]
    fn aqi_labels_cover_the_ordinal_range() {
        assert_eq!(AqiLevel::from_index(1), AqiLevel::Good);
        assert_eq!(AqiLevel::from_index(3), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_index(5), AqiLevel::VeryPoor);
        assert_eq!(AqiLevel::from_index(0), AqiLevel::Unknown);
        assert_eq!(AqiLevel::from_index(9), AqiLevel::Unknown);
        assert_eq!(AqiLevel::from_index(4).as_str(), "Poor");
    }
}
