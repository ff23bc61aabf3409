use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::Password;

use skycast_core::{
    ActiveTab, Aggregator, BackgroundImages, Config, ConditionCategory, EnvLocator,
    OpenWeatherFetcher, OpenWeatherGeocoder, SearchController, SearchQuery, SearchStatus, config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather lookup CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for one of the backing services.
    Configure {
        /// Service short name, e.g. "openweather" or "weatherbit".
        service: String,
    },

    /// Look up current weather, forecast and air quality for a place.
    Show {
        /// City name; when omitted, the device location is used.
        city: Option<String>,

        /// Which result view to print.
        #[arg(long, value_enum, default_value_t = View::Current)]
        view: View,
    },

    /// Ask every condition provider and report the consensus reading.
    Aggregate {
        /// City name.
        city: String,
    },
}

/// Result view selection, mirroring the tab order: current, forecast, air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Current,
    Forecast,
    Air,
}

impl View {
    fn tab(self) -> ActiveTab {
        match self {
            View::Current => ActiveTab::Current,
            View::Forecast => ActiveTab::Forecast,
            View::Air => ActiveTab::AirQuality,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { service } => configure(&service),
            Command::Show { city, view } => show(city, view).await,
            Command::Aggregate { city } => aggregate(&city).await,
        }
    }
}

fn configure(service: &str) -> anyhow::Result<()> {
    let service = service.to_lowercase();
    if !Config::is_known_service(&service) {
        bail!(
            "Unknown service '{service}'. Supported services: {}.",
            Config::known_services().join(", ")
        );
    }

    let api_key = Password::new(&format!("API key for '{service}':"))
        .without_confirmation()
        .with_display_toggle_enabled()
        .prompt()
        .context("Failed to read API key")?;

    let mut cfg = Config::load()?;
    cfg.upsert_api_key(&service, api_key.trim().to_string());
    cfg.save()?;

    println!("Saved API key for '{service}' to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, view: View) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let api_key = cfg.require_api_key(config::OPENWEATHER)?;

    let geocoder = OpenWeatherGeocoder::new(api_key.clone());
    let fetcher = OpenWeatherFetcher::new(api_key);
    let mut controller = SearchController::new(Box::new(geocoder), Box::new(fetcher));
    if let Some(locator) = EnvLocator::from_env() {
        controller = controller.with_locator(Box::new(locator));
    }

    let query = match city {
        Some(name) => SearchQuery::City(name),
        None => SearchQuery::DeviceLocation,
    };

    let session = controller.search(query).await;
    match session.status {
        SearchStatus::Success => {
            let tab = view.tab();
            render::print_session(&session, tab);

            if tab == ActiveTab::Current {
                if let Some(current) = &session.current {
                    let images = BackgroundImages::new(cfg.api_key(config::UNSPLASH));
                    let category = ConditionCategory::from_condition(&current.condition);
                    println!("Backdrop: {}", images.for_category(category).await);
                }
            }
            Ok(())
        }
        _ => {
            let message = session
                .error_message
                .unwrap_or_else(|| "Failed to fetch weather data. Please try again.".to_string());
            bail!(message)
        }
    }
}

async fn aggregate(city: &str) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let aggregator = Aggregator::from_config(&cfg)?;

    let reading = aggregator.aggregate(city).await?;
    render::print_reading(&reading);
    Ok(())
}
