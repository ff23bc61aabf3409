use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    http::truncate_body,
    model::{Place, WeatherReading},
    provider::{CurrentWeatherProvider, ProviderId},
};

const LOCATIONS_URL: &str = "http://dataservice.accuweather.com/locations/v1/cities/search";
const CONDITIONS_URL: &str = "http://dataservice.accuweather.com/currentconditions/v1";

/// AccuWeather current conditions.
///
/// Two sequential calls: a city search resolves a location key, then current
/// conditions are fetched by that key. A failed or empty city search fails
/// the adapter as a whole; there is no retry.
#[derive(Debug, Clone)]
pub struct AccuWeatherProvider {
    api_key: String,
    http: Client,
}

impl AccuWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn search_city(&self, city: &str) -> Result<AwLocation> {
        let res = self
            .http
            .get(LOCATIONS_URL)
            .query(&[("apikey", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .context("Failed to send request to AccuWeather (city search)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read AccuWeather search response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "AccuWeather city search failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let locations: Vec<AwLocation> =
            serde_json::from_str(&body).context("Failed to parse AccuWeather search JSON")?;

        locations
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("AccuWeather city search returned no matches"))
    }

    async fn conditions_by_key(&self, location_key: &str) -> Result<AwConditions> {
        let url = format!("{CONDITIONS_URL}/{location_key}");

        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to send request to AccuWeather (current conditions)")?;

        let status = res.status();
        let body =
            res.text().await.context("Failed to read AccuWeather conditions response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "AccuWeather conditions request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let conditions: Vec<AwConditions> =
            serde_json::from_str(&body).context("Failed to parse AccuWeather conditions JSON")?;

        conditions
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("AccuWeather conditions response contained no data"))
    }
}

#[async_trait]
impl CurrentWeatherProvider for AccuWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AccuWeather
    }

    async fn current(&self, city: &str) -> Result<WeatherReading> {
        let location = self.search_city(city).await?;
        let conditions = self.conditions_by_key(&location.key).await?;
        Ok(map_reading(location, conditions))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwCountry {
    localized_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwLocation {
    key: String,
    localized_name: String,
    country: AwCountry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwMetricValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwMetric {
    metric: AwMetricValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDirection {
    degrees: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwWind {
    speed: AwMetric,
    direction: AwDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwConditions {
    weather_text: String,
    weather_icon: u32,
    temperature: AwMetric,
    real_feel_temperature: AwMetric,
    wind: AwWind,
}

fn map_reading(location: AwLocation, conditions: AwConditions) -> WeatherReading {
    WeatherReading {
        source: ProviderId::AccuWeather,
        condition: conditions.weather_text,
        temperature_c: conditions.temperature.metric.value,
        feels_like_c: conditions.real_feel_temperature.metric.value,
        icon_url: icon_url(conditions.weather_icon),
        wind_speed_kph: conditions.wind.speed.metric.value,
        wind_direction_deg: conditions.wind.direction.degrees,
        location: Place { name: location.localized_name, country: location.country.localized_name },
    }
}

/// Icon numbers are zero-padded to two digits in the published URL scheme.
fn icon_url(icon: u32) -> String {
    format!("https://developer.accuweather.com/sites/default/files/{icon:02}-s.png")
}
