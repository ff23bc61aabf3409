use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::Error, http::truncate_body, model::Coordinates};

const GEO_URL: &str = "https://api.openweathermap.org/geo/1.0";

/// A geocoding hit: resolved coordinates plus display identification.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub country: String,
    pub coords: Coordinates,
}

/// Resolution between place names and coordinates, in either direction.
#[async_trait]
pub trait Geocode: Send + Sync {
    /// Resolve a free-text city name to its best match.
    async fn forward(&self, city: &str) -> Result<GeocodedPlace, Error>;

    /// Resolve coordinates back to a display name.
    async fn reverse(&self, coords: Coordinates) -> Result<GeocodedPlace, Error>;
}

/// Geocoder backed by the OpenWeather geo API.
#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    api_key: String,
    http: Client,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn get_places(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<GeoEntry>, Error> {
        let url = format!("{GEO_URL}/{path}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(Error::network(format!(
                "geocoding request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Geocode for OpenWeatherGeocoder {
    async fn forward(&self, city: &str) -> Result<GeocodedPlace, Error> {
        debug!(city, "forward geocoding");
        let entries = self.get_places("direct", &[("q", city)]).await?;
        first_place(entries)
    }

    async fn reverse(&self, coords: Coordinates) -> Result<GeocodedPlace, Error> {
        debug!(lat = coords.lat, lon = coords.lon, "reverse geocoding");
        let entries = self
            .get_places(
                "reverse",
                &[("lat", coords.lat.to_string().as_str()), ("lon", coords.lon.to_string().as_str())],
            )
            .await?;
        first_place(entries)
    }
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

/// An empty result array is the API's way of saying "no such place".
fn first_place(entries: Vec<GeoEntry>) -> Result<GeocodedPlace, Error> {
    let entry = entries.into_iter().next().ok_or(Error::CityNotFound)?;

    Ok(GeocodedPlace {
        name: entry.name,
        country: entry.country.unwrap_or_default(),
        coords: Coordinates { lat: entry.lat, lon: entry.lon },
    })
}
