use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::Error,
    http::truncate_body,
    model::{AirQuality, Coordinates, CurrentConditions, ForecastEntry, Place},
};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// The three data sets fetched for one resolved location.
#[async_trait]
pub trait FetchWeather: Send + Sync {
    async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, Error>;
    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastEntry>, Error>;
    async fn air_pollution(&self, coords: Coordinates) -> Result<AirQuality, Error>;
}

/// Fetcher backed by the OpenWeather data API, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherFetcher {
    api_key: String,
    http: Client,
}

impl OpenWeatherFetcher {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        coords: Coordinates,
    ) -> Result<T, Error> {
        let url = format!("{BASE_URL}/{path}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.lat.to_string().as_str()),
                ("lon", coords.lon.to_string().as_str()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(Error::WeatherFetchFailed {
                message: format!(
                    "{path} request failed with status {status}: {}",
                    truncate_body(&body),
                ),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FetchWeather for OpenWeatherFetcher {
    async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, Error> {
        debug!(lat = coords.lat, lon = coords.lon, "fetching current conditions");
        let raw: OwCurrent = self.get_json("weather", coords).await?;
        Ok(map_current(raw))
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastEntry>, Error> {
        debug!(lat = coords.lat, lon = coords.lon, "fetching forecast");
        let raw: OwForecast = self.get_json("forecast", coords).await?;
        Ok(map_forecast(raw))
    }

    async fn air_pollution(&self, coords: Coordinates) -> Result<AirQuality, Error> {
        debug!(lat = coords.lat, lon = coords.lon, "fetching air pollution");
        let raw: OwAirPollution = self.get_json("air_pollution", coords).await?;
        map_air_quality(raw)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecast {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAqComponents {
    #[serde(default)]
    co: f64,
    #[serde(default)]
    no2: f64,
    #[serde(default)]
    o3: f64,
    pm2_5: f64,
}

#[derive(Debug, Deserialize)]
struct OwAqEntry {
    main: OwAqMain,
    components: OwAqComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirPollution {
    list: Vec<OwAqEntry>,
}

fn map_current(raw: OwCurrent) -> CurrentConditions {
    let (condition, description) = raw
        .weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description))
        .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

    CurrentConditions {
        location: Place { name: raw.name, country: raw.sys.country.unwrap_or_default() },
        temperature_c: raw.main.temp,
        feels_like_c: raw.main.feels_like,
        humidity_pct: raw.main.humidity,
        cloud_cover_pct: raw.clouds.all,
        wind_speed_mps: raw.wind.speed,
        condition,
        description,
    }
}

fn map_forecast(raw: OwForecast) -> Vec<ForecastEntry> {
    raw.list
        .into_iter()
        .map(|entry| {
            let (condition, description) = entry
                .weather
                .into_iter()
                .next()
                .map(|w| (w.main, w.description))
                .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

            ForecastEntry {
                timestamp: unix_to_utc(entry.dt),
                temperature_c: entry.main.temp,
                condition,
                description,
            }
        })
        .collect()
}

fn map_air_quality(raw: OwAirPollution) -> Result<AirQuality, Error> {
    let entry = raw.list.into_iter().next().ok_or_else(|| Error::Parse {
        message: "air pollution response contained no data".to_string(),
    })?;

    Ok(AirQuality {
        aqi: entry.main.aqi,
        co: entry.components.co,
        no2: entry.components.no2,
        o3: entry.components.o3,
        pm2_5: entry.components.pm2_5,
    })
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
