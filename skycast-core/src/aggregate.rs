use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::Error,
    model::WeatherReading,
    provider::{CurrentWeatherProvider, providers_from_config},
};

/// Fans one city lookup out to every condition provider and fuses the
/// answers into a single representative reading.
///
/// Providers vote with their `condition` string (case-sensitive exact
/// match). The winning condition is the first one to reach the maximum
/// count in provider order, and the returned reading is the first one in
/// provider order that carries it: a whole reading from one provider,
/// never a merge.
pub struct Aggregator {
    providers: Vec<Box<dyn CurrentWeatherProvider>>,
}

impl Aggregator {
    pub fn new(providers: Vec<Box<dyn CurrentWeatherProvider>>) -> Self {
        Self { providers }
    }

    /// All three standard providers, keys taken from config.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self::new(providers_from_config(config)?))
    }

    pub async fn aggregate(&self, city: &str) -> Result<WeatherReading, Error> {
        let lookups = self.providers.iter().map(|provider| async move {
            match provider.current(city).await {
                Ok(reading) => Some(reading),
                Err(err) => {
                    // Absorbed here: one dead provider must not sink the vote.
                    warn!(provider = %provider.id(), error = %err, "provider lookup failed");
                    None
                }
            }
        });

        let readings: Vec<WeatherReading> =
            join_all(lookups).await.into_iter().flatten().collect();

        if readings.is_empty() {
            return Err(Error::NoProviderAvailable);
        }

        let condition = winning_condition(&readings);
        debug!(%condition, voters = readings.len(), "selected consensus condition");

        readings
            .into_iter()
            .find(|reading| reading.condition == condition)
            .ok_or(Error::NoProviderAvailable)
    }
}

/// First condition string to reach the maximum vote count, scanning readings
/// in provider order. Caller guarantees `readings` is non-empty.
fn winning_condition(readings: &[WeatherReading]) -> String {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for reading in readings {
        *totals.entry(reading.condition.as_str()).or_insert(0) += 1;
    }
    let max = totals.values().copied().max().unwrap_or(0);

    let mut running: HashMap<&str, usize> = HashMap::new();
    for reading in readings {
        let count = running.entry(reading.condition.as_str()).or_insert(0);
        *count += 1;
        if *count == max {
            return reading.condition.clone();
        }
    }

    // Unreachable for non-empty input; keeps the function total.
    String::new()
}
