//! Placeholder data used when a provider cannot be reached or understood.

use chrono::{Days, NaiveDate};

use crate::model::{
    CurrentConditions, ForecastDay, ForecastLocation, ForecastRecord, Location, LocationCandidate,
    WeatherRecord, timestamp_now,
};
use crate::provider::ProviderId;

pub const UNAVAILABLE_CONDITION: &str = "Data Unavailable";
pub const UNAVAILABLE_DESCRIPTION: &str = "Fallback data - API temporarily unavailable";
pub const FALLBACK_SOURCE: &str = "Fallback";
pub const UNKNOWN_COUNTRY: &str = "N/A";

/// Sentinel current conditions standing in for `provider`.
pub fn current(query: &str, provider: ProviderId) -> WeatherRecord {
    WeatherRecord {
        location: Location {
            name: query.to_string(),
            country: UNKNOWN_COUNTRY.to_string(),
            lat: None,
            lon: None,
        },
        current: CurrentConditions {
            temperature: 20.0,
            feels_like: 18.0,
            humidity: 65,
            pressure: 1013,
            wind_speed: 3.5,
            condition: UNAVAILABLE_CONDITION.to_string(),
            description: UNAVAILABLE_DESCRIPTION.to_string(),
        },
        sources: vec![provider.fallback_label().to_string()],
        last_updated: timestamp_now(),
    }
}

/// `days` synthetic days starting at `start`, warming by one degree per day.
pub fn forecast(query: &str, days: u8, start: NaiveDate) -> ForecastRecord {
    let forecast = (0..days)
        .map(|i| ForecastDay {
            date: start
                .checked_add_days(Days::new(u64::from(i)))
                .unwrap_or(start)
                .format("%Y-%m-%d")
                .to_string(),
            max_temp: 22.0 + f64::from(i),
            min_temp: 12.0 + f64::from(i),
            humidity: 60,
            condition: UNAVAILABLE_CONDITION.to_string(),
        })
        .collect();

    ForecastRecord {
        location: ForecastLocation {
            name: query.to_string(),
            country: UNKNOWN_COUNTRY.to_string(),
        },
        forecast,
        sources: vec![FALLBACK_SOURCE.to_string()],
    }
}

/// Two fixed candidates named after the query.
pub fn locations(query: &str) -> Vec<LocationCandidate> {
    vec![
        candidate("1", query, "US", 40.7128, -74.0060),
        candidate("2", query, "UK", 51.5074, -0.1278),
    ]
}

fn candidate(id: &str, name: &str, country: &str, lat: f64, lon: f64) -> LocationCandidate {
    LocationCandidate {
        id: id.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        lat,
        lon,
        source: FALLBACK_SOURCE.to_string(),
    }
}
