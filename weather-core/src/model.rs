use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where a current-weather reading was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub condition: String,
    pub description: String,
}

/// Current weather for one location, from one or more providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub location: Location,
    pub current: CurrentConditions,
    pub sources: Vec<String>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: String,
    pub max_temp: f64,
    pub min_temp: f64,
    pub humidity: i32,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub location: ForecastLocation,
    pub forecast: Vec<ForecastDay>,
    pub sources: Vec<String>,
}

/// One match returned by a location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub id: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub locations: Vec<LocationCandidate>,
    pub count: usize,
}

impl LocationData {
    pub fn new(locations: Vec<LocationCandidate>) -> Self {
        let count = locations.len();
        Self { locations, count }
    }
}

/// Local wall-clock time in the `YYYY-MM-DDTHH:MM:SS.mmm` form used for
/// `lastUpdated` and the health payload.
pub fn timestamp_now() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
