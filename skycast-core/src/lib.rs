//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Normalizing adapters over external weather providers and the
//!   majority-vote aggregator across them
//! - Geocoding, the three-part weather fetch, and the search session
//!   orchestration with stale-completion protection
//! - Shared domain models (readings, forecasts, air quality)
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or
//! services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geocode;
mod http;
pub mod imagery;
pub mod model;
pub mod provider;
pub mod session;

pub use aggregate::Aggregator;
pub use config::Config;
pub use error::Error;
pub use fetch::{FetchWeather, OpenWeatherFetcher};
pub use geocode::{Geocode, GeocodedPlace, OpenWeatherGeocoder};
pub use imagery::BackgroundImages;
pub use model::{
    AirQuality, AqiLevel, ConditionCategory, Coordinates, CurrentConditions, ForecastEntry,
    Place, WeatherReading,
};
pub use provider::{CurrentWeatherProvider, ProviderId};
pub use session::{
    ActiveTab, DeviceLocate, EnvLocator, SearchController, SearchQuery, SearchSession,
    SearchStatus,
};

/// Core result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
