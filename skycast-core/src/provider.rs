use crate::{
    config::Config,
    error::Error,
    model::WeatherReading,
    provider::{
        accuweather::AccuWeatherProvider, weatherapi::WeatherApiProvider,
        weatherbit::WeatherbitProvider,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod accuweather;
pub mod weatherapi;
pub mod weatherbit;

/// Condition providers queried by the aggregation pipeline, in vote order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    WeatherApi,
    Weatherbit,
    AccuWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::Weatherbit => "weatherbit",
            ProviderId::AccuWeather => "accuweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WeatherApi, ProviderId::Weatherbit, ProviderId::AccuWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "weatherbit" => Ok(ProviderId::Weatherbit),
            "accuweather" => Ok(ProviderId::AccuWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, weatherbit, accuweather."
            )),
        }
    }
}

/// One external source of current conditions for a named city.
///
/// Implementations normalize units and icon URLs into [`WeatherReading`];
/// any upstream failure is an ordinary error here and is absorbed by the
/// aggregator, never surfaced on its own.
#[async_trait]
pub trait CurrentWeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current(&self, city: &str) -> anyhow::Result<WeatherReading>;
}

/// Construct a single provider adapter from config.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> Result<Box<dyn CurrentWeatherProvider>, Error> {
    let api_key = config.require_api_key(id.as_str())?;

    let boxed: Box<dyn CurrentWeatherProvider> = match id {
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(api_key)),
        ProviderId::Weatherbit => Box::new(WeatherbitProvider::new(api_key)),
        ProviderId::AccuWeather => Box::new(AccuWeatherProvider::new(api_key)),
    };

    Ok(boxed)
}

/// Construct every configured provider, in vote order.
pub fn providers_from_config(
    config: &Config,
) -> Result<Vec<Box<dyn CurrentWeatherProvider>>, Error> {
    ProviderId::all().iter().map(|id| provider_from_config(*id, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::WeatherApi, &cfg).unwrap_err();
        assert!(matches!(err, Error::MissingCredential { .. }));
    }

    #[test]
    fn providers_from_config_builds_all_three_when_configured() {
        let mut cfg = Config::default();
        for id in ProviderId::all() {
            cfg.upsert_api_key(id.as_str(), "KEY".to_string());
        }

        let providers = providers_from_config(&cfg).expect("all keys configured");
        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0].id(), ProviderId::WeatherApi);
        assert_eq!(providers[2].id(), ProviderId::AccuWeather);
    }

    #[test]
    fn providers_from_config_fails_on_first_missing_key() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(config::WEATHERAPI, "KEY".to_string());

        let err = providers_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("weatherbit"));
    }
}
