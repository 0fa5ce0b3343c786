use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{
        CurrentConditions, ForecastDay, ForecastLocation, ForecastRecord, Location,
        LocationCandidate, WeatherRecord, timestamp_now,
    },
    provider::{ProviderId, coordinate_id, fetch_text},
};

use super::WeatherProvider;

const ID: ProviderId = ProviderId::WeatherApi;

/// WeatherAPI.com reports wind in km/h; the shared model uses m/s.
const KPH_PER_MPS: f64 = 3.6;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn with_client(api_key: String, base_url: &str, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: i32,
    pressure_mb: f64,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaSearchEntry {
    id: Option<i64>,
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avghumidity: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaForecastLocation,
    forecast: WaForecast,
}

/// Map a WeatherAPI.com `current.json` body onto a [`WeatherRecord`].
///
/// WeatherAPI has a single condition text, so it fills both `condition` and
/// `description`. `pressure_mb` arrives as a decimal and is truncated.
pub fn normalize_current(body: &str) -> Result<WeatherRecord, ProviderError> {
    let parsed: WaResponse = serde_json::from_str(body)
        .map_err(|source| ProviderError::Normalize {
            provider: ID,
            source,
        })?;

    let current = parsed.current;

    Ok(WeatherRecord {
        location: Location {
            name: parsed.location.name,
            country: parsed.location.country,
            lat: Some(parsed.location.lat),
            lon: Some(parsed.location.lon),
        },
        current: CurrentConditions {
            temperature: current.temp_c,
            feels_like: current.feelslike_c,
            humidity: current.humidity,
            pressure: current.pressure_mb as i32,
            wind_speed: current.wind_kph / KPH_PER_MPS,
            condition: current.condition.text.clone(),
            description: current.condition.text,
        },
        sources: vec![ID.label().to_string()],
        last_updated: timestamp_now(),
    })
}

/// Map a WeatherAPI.com `search.json` body onto location candidates.
pub fn normalize_search(body: &str) -> Result<Vec<LocationCandidate>, ProviderError> {
    let parsed: Vec<WaSearchEntry> = serde_json::from_str(body)
        .map_err(|source| ProviderError::Normalize {
            provider: ID,
            source,
        })?;

    Ok(parsed
        .into_iter()
        .map(|entry| LocationCandidate {
            id: entry
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| coordinate_id(entry.lat, entry.lon)),
            name: entry.name,
            country: entry.country,
            lat: entry.lat,
            lon: entry.lon,
            source: ID.label().to_string(),
        })
        .collect())
}

/// Map a WeatherAPI.com `forecast.json` body onto at most `days` forecast days.
pub fn normalize_forecast(body: &str, days: u8) -> Result<ForecastRecord, ProviderError> {
    let parsed: WaForecastResponse = serde_json::from_str(body)
        .map_err(|source| ProviderError::Normalize {
            provider: ID,
            source,
        })?;

    let forecast = parsed
        .forecast
        .forecastday
        .into_iter()
        .take(usize::from(days))
        .map(|entry| ForecastDay {
            date: entry.date,
            max_temp: entry.day.maxtemp_c,
            min_temp: entry.day.mintemp_c,
            humidity: entry.day.avghumidity as i32,
            condition: entry.day.condition.text,
        })
        .collect();

    Ok(ForecastRecord {
        location: ForecastLocation {
            name: parsed.location.name,
            country: parsed.location.country,
        },
        forecast,
        sources: vec![ID.label().to_string()],
    })
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn current(&self, location: &str) -> Result<WeatherRecord, ProviderError> {
        let url = format!("{}/v1/current.json", self.base_url);
        let body = fetch_text(
            &self.http,
            ID,
            &url,
            &[("key", self.api_key.as_str()), ("q", location), ("aqi", "no")],
        )
        .await?;

        normalize_current(&body)
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, ProviderError> {
        let url = format!("{}/v1/search.json", self.base_url);
        let body = fetch_text(
            &self.http,
            ID,
            &url,
            &[("key", self.api_key.as_str()), ("q", query)],
        )
        .await?;

        normalize_search(&body)
    }

    async fn forecast(&self, location: &str, days: u8) -> Result<ForecastRecord, ProviderError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let days_param = days.to_string();
        let body = fetch_text(
            &self.http,
            ID,
            &url,
            &[
                ("key", self.api_key.as_str()),
                ("q", location),
                ("days", days_param.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ],
        )
        .await?;

        normalize_forecast(&body, days)
    }
}
