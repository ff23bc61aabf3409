use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::Error,
    fetch::FetchWeather,
    geocode::Geocode,
    model::{AirQuality, Coordinates, CurrentConditions, ForecastEntry},
};

/// How many forecast samples a session keeps.
const FORECAST_LEN: usize = 5;

/// What the user asked to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    City(String),
    DeviceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Which result view is selected. Independent of the session lifecycle:
/// switching tabs never touches the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    #[default]
    Current,
    Forecast,
    AirQuality,
}

/// State of one search attempt, from initiation to resolution.
///
/// A session is replaced wholesale on every new search; result fields are
/// only ever populated together on success, and `error_message` only on
/// error.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    pub query: Option<SearchQuery>,
    pub status: SearchStatus,
    pub current: Option<CurrentConditions>,
    pub forecast: Option<Vec<ForecastEntry>>,
    pub air_quality: Option<AirQuality>,
    pub error_message: Option<String>,
}

impl SearchSession {
    fn loading(query: SearchQuery) -> Self {
        Self { query: Some(query), status: SearchStatus::Loading, ..Self::default() }
    }
}

/// Source of the host's own coordinates.
///
/// Implementations map their platform's failure modes onto
/// [`Error::LocationDenied`] and [`Error::LocationTimeout`]; a host with no
/// capability at all simply configures no locator.
#[async_trait]
pub trait DeviceLocate: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, Error>;
}

/// Locator that reads fixed coordinates from `SKYCAST_LAT`/`SKYCAST_LON`.
///
/// Stands in for a platform location capability on hosts that have none;
/// absent or malformed variables mean the capability is absent and no
/// locator should be configured.
#[derive(Debug, Clone, Copy)]
pub struct EnvLocator {
    coords: Coordinates,
}

impl EnvLocator {
    pub fn from_env() -> Option<Self> {
        let lat = std::env::var("SKYCAST_LAT").ok()?;
        let lon = std::env::var("SKYCAST_LON").ok()?;
        Self::from_pair(&lat, &lon)
    }

    fn from_pair(lat: &str, lon: &str) -> Option<Self> {
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some(Self { coords: Coordinates { lat, lon } })
    }
}

#[async_trait]
impl DeviceLocate for EnvLocator {
    async fn current_position(&self) -> Result<Coordinates, Error> {
        Ok(self.coords)
    }
}

/// Sequences one search: resolve coordinates, fetch the three data sets
/// concurrently, apply them to the session in one step.
///
/// Every `search` call takes a fresh generation id. A completion whose id is
/// no longer the latest is dropped without touching the session, so a slow
/// earlier search can never overwrite a later one.
pub struct SearchController {
    geocoder: Box<dyn Geocode>,
    fetcher: Box<dyn FetchWeather>,
    locator: Option<Box<dyn DeviceLocate>>,
    generation: AtomicU64,
    session: Mutex<SearchSession>,
}

impl SearchController {
    pub fn new(geocoder: Box<dyn Geocode>, fetcher: Box<dyn FetchWeather>) -> Self {
        Self {
            geocoder,
            fetcher,
            locator: None,
            generation: AtomicU64::new(0),
            session: Mutex::new(SearchSession::default()),
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: Box<dyn DeviceLocate>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Snapshot of the current session state.
    pub async fn session(&self) -> SearchSession {
        self.session.lock().await.clone()
    }

    /// Run one search to completion and return the resulting session state.
    pub async fn search(&self, query: SearchQuery) -> SearchSession {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut session = self.session.lock().await;
            *session = SearchSession::loading(query.clone());
        }

        let outcome = self.run(&query).await;

        let mut session = self.session.lock().await;
        if self.generation.load(Ordering::SeqCst) != id {
            // A newer search owns the session; this completion is stale.
            debug!(generation = id, "dropping stale search completion");
            return session.clone();
        }

        match outcome {
            Ok((current, forecast, air_quality)) => {
                session.status = SearchStatus::Success;
                session.current = Some(current);
                session.forecast = Some(forecast);
                session.air_quality = Some(air_quality);
                session.error_message = None;
            }
            Err(err) => {
                session.status = SearchStatus::Error;
                session.current = None;
                session.forecast = None;
                session.air_quality = None;
                session.error_message = Some(err.user_message());
            }
        }
        session.clone()
    }

    async fn run(
        &self,
        query: &SearchQuery,
    ) -> Result<(CurrentConditions, Vec<ForecastEntry>, AirQuality), Error> {
        let coords = match query {
            SearchQuery::City(name) => {
                let place = self.geocoder.forward(name).await?;
                debug!(name = %place.name, country = %place.country, "geocoded city");
                place.coords
            }
            SearchQuery::DeviceLocation => {
                let locator = self.locator.as_ref().ok_or(Error::LocationUnavailable)?;
                let coords = locator.current_position().await?;
                let place = self.geocoder.reverse(coords).await?;
                debug!(name = %place.name, "resolved device location");
                coords
            }
        };

        // All three or nothing: a partial result set is never applied.
        let (current, mut forecast, air_quality) = tokio::try_join!(
            self.fetcher.current(coords),
            self.fetcher.forecast(coords),
            self.fetcher.air_pollution(coords),
        )
        .map_err(|err| match err {
            Error::WeatherFetchFailed { .. } => err,
            other => Error::WeatherFetchFailed { message: other.user_message() },
        })?;

        forecast.sort_by_key(|entry| entry.timestamp);
        forecast.truncate(FORECAST_LEN);

        Ok((current, forecast, air_quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodedPlace;
    use crate::model::Place;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Debug)]
    struct StubGeocoder {
        known: Vec<(&'static str, Coordinates)>,
    }

    impl StubGeocoder {
        fn place(name: &str, coords: Coordinates) -> GeocodedPlace {
            GeocodedPlace { name: name.to_string(), country: "XX".to_string(), coords }
        }
    }

    #[async_trait]
    impl Geocode for StubGeocoder {
        async fn forward(&self, city: &str) -> Result<GeocodedPlace, Error> {
            self.known
                .iter()
                .find(|(name, _)| *name == city)
                .map(|(name, coords)| Self::place(name, *coords))
                .ok_or(Error::CityNotFound)
        }

        async fn reverse(&self, coords: Coordinates) -> Result<GeocodedPlace, Error> {
            self.known
                .iter()
                .find(|(_, known)| known == &coords)
                .map(|(name, coords)| Self::place(name, *coords))
                .ok_or(Error::CityNotFound)
        }
    }

    /// Fetcher that names its results after the coordinates it was given, so
    /// tests can tell which search produced the session contents. A gate on
    /// one coordinate pair lets a test hold that search open.
    struct StubFetcher {
        fail_air: bool,
        forecast_len: usize,
        gate: Option<Gate>,
    }

    struct Gate {
        lat: f64,
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl StubFetcher {
        fn plain() -> Self {
            Self { fail_air: false, forecast_len: 5, gate: None }
        }
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    #[async_trait]
    impl FetchWeather for StubFetcher {
        async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, Error> {
            if let Some(gate) = &self.gate {
                if gate.lat == coords.lat {
                    gate.started.notify_one();
                    gate.release.notified().await;
                }
            }
            Ok(CurrentConditions {
                location: Place { name: format!("city-{}", coords.lat), country: "XX".into() },
                temperature_c: 20.0,
                feels_like_c: 19.0,
                humidity_pct: 50,
                cloud_cover_pct: 10,
                wind_speed_mps: 3.0,
                condition: "Clear".into(),
                description: "clear sky".into(),
            })
        }

        async fn forecast(&self, _coords: Coordinates) -> Result<Vec<ForecastEntry>, Error> {
            // Entries handed back newest-first to prove the session reorders.
            Ok((0..self.forecast_len)
                .rev()
                .map(|i| ForecastEntry {
                    timestamp: base_time() + Duration::hours(3 * i as i64),
                    temperature_c: 10.0 + i as f64,
                    condition: "Clouds".into(),
                    description: "broken clouds".into(),
                })
                .collect())
        }

        async fn air_pollution(&self, _coords: Coordinates) -> Result<AirQuality, Error> {
            if self.fail_air {
                return Err(Error::network("air pollution upstream down"));
            }
            Ok(AirQuality { aqi: 2, co: 201.9, no2: 0.77, o3: 68.66, pm2_5: 0.5 })
        }
    }

    fn geocoder() -> Box<dyn Geocode> {
        Box::new(StubGeocoder {
            known: vec![
                ("Paris", Coordinates { lat: 1.0, lon: 1.0 }),
                ("Tokyo", Coordinates { lat: 2.0, lon: 2.0 }),
            ],
        })
    }

    #[tokio::test]
    async fn successful_search_populates_all_results() {
        let controller = SearchController::new(geocoder(), Box::new(StubFetcher::plain()));

        let session = controller.search(SearchQuery::City("Tokyo".into())).await;
        assert_eq!(session.status, SearchStatus::Success);
        assert_eq!(session.current.as_ref().map(|c| c.location.name.as_str()), Some("city-2"));
        assert_eq!(session.forecast.as_ref().map(Vec::len), Some(5));
        assert!(session.air_quality.is_some());
        assert_eq!(session.error_message, None);
    }

    #[tokio::test]
    async fn unknown_city_is_an_error_with_empty_results() {
        let controller = SearchController::new(geocoder(), Box::new(StubFetcher::plain()));

        let session = controller.search(SearchQuery::City("Atlantis".into())).await;
        assert_eq!(session.status, SearchStatus::Error);
        assert_eq!(session.error_message.as_deref(), Some("City not found"));
        assert!(session.current.is_none());
        assert!(session.forecast.is_none());
        assert!(session.air_quality.is_none());
    }

    #[tokio::test]
    async fn one_failed_fetch_discards_the_other_results() {
        let fetcher = StubFetcher { fail_air: true, ..StubFetcher::plain() };
        let controller = SearchController::new(geocoder(), Box::new(fetcher));

        let session = controller.search(SearchQuery::City("Paris".into())).await;
        assert_eq!(session.status, SearchStatus::Error);
        assert!(session.error_message.is_some());
        // Current and forecast succeeded upstream but must not be applied.
        assert!(session.current.is_none());
        assert!(session.forecast.is_none());
        assert!(session.air_quality.is_none());
    }

    #[tokio::test]
    async fn forecast_is_trimmed_to_five_ascending_entries() {
        let fetcher = StubFetcher { forecast_len: 8, ..StubFetcher::plain() };
        let controller = SearchController::new(geocoder(), Box::new(fetcher));

        let session = controller.search(SearchQuery::City("Paris".into())).await;
        let forecast = session.forecast.expect("search succeeded");
        assert_eq!(forecast.len(), 5);
        for pair in forecast.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        // The five earliest of the eight samples survive.
        assert_eq!(forecast[0].timestamp, base_time());
        assert_eq!(forecast[4].timestamp, base_time() + Duration::hours(12));
    }

    #[tokio::test]
    async fn device_location_without_locator_is_unavailable() {
        let controller = SearchController::new(geocoder(), Box::new(StubFetcher::plain()));

        let session = controller.search(SearchQuery::DeviceLocation).await;
        assert_eq!(session.status, SearchStatus::Error);
        assert_eq!(
            session.error_message.as_deref(),
            Some("Location is not available on this device")
        );
    }

    struct StubLocator {
        outcome: Result<Coordinates, Error>,
    }

    #[async_trait]
    impl DeviceLocate for StubLocator {
        async fn current_position(&self) -> Result<Coordinates, Error> {
            match &self.outcome {
                Ok(coords) => Ok(*coords),
                Err(Error::LocationDenied) => Err(Error::LocationDenied),
                Err(Error::LocationTimeout) => Err(Error::LocationTimeout),
                Err(_) => Err(Error::LocationUnavailable),
            }
        }
    }

    #[tokio::test]
    async fn device_location_resolves_through_reverse_geocoding() {
        let locator = StubLocator { outcome: Ok(Coordinates { lat: 2.0, lon: 2.0 }) };
        let controller = SearchController::new(geocoder(), Box::new(StubFetcher::plain()))
            .with_locator(Box::new(locator));

        let session = controller.search(SearchQuery::DeviceLocation).await;
        assert_eq!(session.status, SearchStatus::Success);
        assert_eq!(session.current.as_ref().map(|c| c.location.name.as_str()), Some("city-2"));
    }

    #[tokio::test]
    async fn denied_location_surfaces_as_denied() {
        let locator = StubLocator { outcome: Err(Error::LocationDenied) };
        let controller = SearchController::new(geocoder(), Box::new(StubFetcher::plain()))
            .with_locator(Box::new(locator));

        let session = controller.search(SearchQuery::DeviceLocation).await;
        assert_eq!(session.status, SearchStatus::Error);
        assert_eq!(session.error_message.as_deref(), Some("Location access was denied"));
    }

    #[tokio::test]
    async fn stale_completion_never_overwrites_a_newer_search() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let fetcher = StubFetcher {
            gate: Some(Gate {
                lat: 1.0, // hold the Paris search open
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            }),
            ..StubFetcher::plain()
        };
        let controller = Arc::new(SearchController::new(geocoder(), Box::new(fetcher)));

        let paris = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(SearchQuery::City("Paris".into())).await })
        };

        // Wait until Paris is mid-fetch, then observe the loading state.
        started.notified().await;
        let in_flight = controller.session().await;
        assert_eq!(in_flight.status, SearchStatus::Loading);
        assert!(in_flight.current.is_none());

        let tokyo = controller.search(SearchQuery::City("Tokyo".into())).await;
        assert_eq!(tokyo.status, SearchStatus::Success);

        // Let Paris finish late; its completion must be dropped.
        release.notify_one();
        let from_paris = paris.await.expect("search task completed");

        assert_eq!(
            from_paris.current.as_ref().map(|c| c.location.name.as_str()),
            Some("city-2")
        );
        let final_session = controller.session().await;
        assert_eq!(final_session.status, SearchStatus::Success);
        assert_eq!(
            final_session.current.as_ref().map(|c| c.location.name.as_str()),
            Some("city-2")
        );
        assert_eq!(final_session.query, Some(SearchQuery::City("Tokyo".into())));
    }

    #[test]
    fn active_tab_defaults_to_current() {
        assert_eq!(ActiveTab::default(), ActiveTab::Current);
    }

    #[test]
    fn env_locator_rejects_malformed_coordinates() {
        assert!(EnvLocator::from_pair("48.85", "2.35").is_some());
        assert!(EnvLocator::from_pair(" 48.85 ", "2.35").is_some());
        assert!(EnvLocator::from_pair("north", "2.35").is_none());
        assert!(EnvLocator::from_pair("NaN", "2.35").is_none());
        assert!(EnvLocator::from_pair("", "").is_none());
    }
}
