use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    http::truncate_body,
    model::{Place, WeatherReading},
    provider::{CurrentWeatherProvider, ProviderId},
};

/// WeatherAPI.com current conditions. Reports wind in kph already; the icon
/// URL comes back protocol-relative and needs a scheme.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }
}

#[async_trait]
impl CurrentWeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn current(&self, city: &str) -> Result<WeatherReading> {
        let url = "http://api.weatherapi.com/v1/current.json";

        let res = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .context("Failed to send request to WeatherAPI.com (current)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read WeatherAPI current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "WeatherAPI current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: WaResponse =
            serde_json::from_str(&body).context("Failed to parse WeatherAPI current JSON")?;

        Ok(map_reading(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    wind_kph: f64,
    wind_degree: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

fn map_reading(parsed: WaResponse) -> WeatherReading {
    WeatherReading {
        source: ProviderId::WeatherApi,
        condition: parsed.current.condition.text,
        temperature_c: parsed.current.temp_c,
        feels_like_c: parsed.current.feelslike_c,
        icon_url: expand_icon_url(&parsed.current.condition.icon),
        wind_speed_kph: parsed.current.wind_kph,
        wind_direction_deg: parsed.current.wind_degree,
        location: Place { name: parsed.location.name, country: parsed.location.country },
    }
}

/// The API serves icons as `//cdn.weatherapi.com/...`.
fn expand_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}
