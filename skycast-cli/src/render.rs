//! Plain-text rendering of session results and aggregated readings.

use chrono::Local;

use skycast_core::{
    ActiveTab, AirQuality, CurrentConditions, ForecastEntry, SearchSession, WeatherReading,
};

/// Print the selected view of a successful session.
pub fn print_session(session: &SearchSession, tab: ActiveTab) {
    match tab {
        ActiveTab::Current => {
            if let Some(current) = &session.current {
                print_current(current);
            }
        }
        ActiveTab::Forecast => {
            if let Some(forecast) = &session.forecast {
                print_forecast(forecast);
            }
        }
        ActiveTab::AirQuality => {
            if let Some(air) = &session.air_quality {
                print_air(air);
            }
        }
    }
}

fn print_current(current: &CurrentConditions) {
    println!("{}, {}", current.location.name, current.location.country);
    println!("{}", Local::now().format("%A, %B %e, %l:%M %p"));
    println!();
    println!("{} ({})", current.condition, current.description);
    println!("{:.0}°C, feels like {:.0}°C", current.temperature_c, current.feels_like_c);
    println!(
        "Humidity {}%   Clouds {}%   Wind {} m/s",
        current.humidity_pct, current.cloud_cover_pct, current.wind_speed_mps
    );
}

fn print_forecast(forecast: &[ForecastEntry]) {
    for entry in forecast {
        println!(
            "{}  {:>5.1}°C  {} ({})",
            entry.timestamp.format("%a, %b %e %H:%M"),
            entry.temperature_c,
            entry.condition,
            entry.description
        );
    }
}

fn print_air(air: &AirQuality) {
    println!("Air Quality: {}", air.level());
    println!("PM2.5: {} μg/m³", air.pm2_5);
    println!("CO: {} μg/m³   NO2: {} μg/m³   O3: {} μg/m³", air.co, air.no2, air.o3);
}

/// Print the consensus reading from the aggregation pipeline.
pub fn print_reading(reading: &WeatherReading) {
    println!("{} ({})", reading.location.name, reading.location.country);
    println!("{}", reading.condition);
    println!("{:.1}°C, feels like {:.1}°C", reading.temperature_c, reading.feels_like_c);
    println!("Wind {:.1} kph at {:.0}°", reading.wind_speed_kph, reading.wind_direction_deg);
    println!("Icon: {}", reading.icon_url);
    println!("Reported by {}", reading.source);
}
