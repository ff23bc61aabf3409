use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    http::truncate_body,
    model::{Place, WeatherReading, mps_to_kph},
    provider::{CurrentWeatherProvider, ProviderId},
};

/// Weatherbit current conditions. Wind arrives in m/s and the icon field is
/// a bare code that has to be expanded into the CDN URL.
#[derive(Debug, Clone)]
pub struct WeatherbitProvider {
    api_key: String,
    http: Client,
}

impl WeatherbitProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }
}

#[async_trait]
impl CurrentWeatherProvider for WeatherbitProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Weatherbit
    }

    async fn current(&self, city: &str) -> Result<WeatherReading> {
        let url = "https://api.weatherbit.io/v2.0/current";

        let res = self
            .http
            .get(url)
            .query(&[("city", city), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to send request to Weatherbit (current)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read Weatherbit current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Weatherbit current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: WbResponse =
            serde_json::from_str(&body).context("Failed to parse Weatherbit current JSON")?;

        map_reading(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct WbWeather {
    icon: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct WbEntry {
    city_name: String,
    country_code: String,
    temp: f64,
    app_temp: f64,
    wind_spd: f64,
    wind_dir: f64,
    weather: WbWeather,
}

#[derive(Debug, Deserialize)]
struct WbResponse {
    data: Vec<WbEntry>,
}

fn map_reading(parsed: WbResponse) -> Result<WeatherReading> {
    let entry = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Weatherbit response contained no data"))?;

    Ok(WeatherReading {
        source: ProviderId::Weatherbit,
        condition: entry.weather.description,
        temperature_c: entry.temp,
        feels_like_c: entry.app_temp,
        icon_url: icon_url(&entry.weather.icon),
        wind_speed_kph: mps_to_kph(entry.wind_spd),
        wind_direction_deg: entry.wind_dir,
        location: Place { name: entry.city_name, country: entry.country_code },
    })
}

fn icon_url(code: &str) -> String {
    format!("https://www.weatherbit.io/static/img/icons/{code}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WbResponse {
        serde_json::from_str(
            r#"{"data": [{
                "city_name": "Berlin",
                "country_code": "DE",
                "temp": 18.3,
                "app_temp": 17.9,
                "wind_spd": 10.0,
                "wind_dir": 90,
                "weather": {"icon": "c02d", "description": "Scattered clouds"}
            }]}"#,
        )
        .expect("valid Weatherbit JSON")
    }

    #[test]
    fn converts_wind_speed_to_kph() {
        let reading = map_reading(sample()).expect("non-empty data");
        assert_eq!(reading.wind_speed_kph, 36.0);
    }

    #[test]
    fn maps_first_entry_and_expands_icon_code() {
        let reading = map_reading(sample()).expect("non-empty data");
        assert_eq!(reading.source, ProviderId::Weatherbit);
        assert_eq!(reading.condition, "Scattered clouds");
        assert_eq!(reading.icon_url, "https://www.weatherbit.io/static/img/icons/c02d.png");
        assert_eq!(reading.location, Place { name: "Berlin".into(), country: "DE".into() });
    }

    #[test]
    fn empty_data_array_is_an_error() {
        let parsed: WbResponse = serde_json::from_str(r#"{"data": []}"#).expect("valid JSON");
        assert!(map_reading(parsed).is_err());
    }
}
