use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{CurrentConditions, Location, LocationCandidate, WeatherRecord, timestamp_now},
    provider::{ProviderId, coordinate_id, fetch_text},
};

use super::WeatherProvider;

const ID: ProviderId = ProviderId::OpenWeather;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_client(api_key: String, base_url: &str, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: i32,
    pressure: i32,
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
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

/// Map an OpenWeatherMap `/data/2.5/weather` body onto a [`WeatherRecord`].
pub fn normalize_current(body: &str) -> Result<WeatherRecord, ProviderError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|source| ProviderError::Normalize {
            provider: ID,
            source,
        })?;

    let weather = parsed.weather.into_iter().next().ok_or_else(|| ProviderError::Normalize {
        provider: ID,
        source: serde::de::Error::custom("`weather` list is empty"),
    })?;

    Ok(WeatherRecord {
        location: Location {
            name: parsed.name,
            country: parsed.sys.country,
            lat: Some(parsed.coord.lat),
            lon: Some(parsed.coord.lon),
        },
        current: CurrentConditions {
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            pressure: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            condition: weather.main,
            description: weather.description,
        },
        sources: vec![ID.label().to_string()],
        last_updated: timestamp_now(),
    })
}

/// Map an OpenWeatherMap geocoding body onto location candidates.
pub fn normalize_search(body: &str) -> Result<Vec<LocationCandidate>, ProviderError> {
    let parsed: Vec<OwGeocodeEntry> = serde_json::from_str(body)
        .map_err(|source| ProviderError::Normalize {
            provider: ID,
            source,
        })?;

    Ok(parsed
        .into_iter()
        .map(|entry| LocationCandidate {
            id: coordinate_id(entry.lat, entry.lon),
            name: entry.name,
            country: entry.country,
            lat: entry.lat,
            lon: entry.lon,
            source: ID.label().to_string(),
        })
        .collect())
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn current(&self, location: &str) -> Result<WeatherRecord, ProviderError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let body = fetch_text(
            &self.http,
            ID,
            &url,
            &[("q", location), ("appid", self.api_key.as_str()), ("units", "metric")],
        )
        .await?;

        normalize_current(&body)
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, ProviderError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let body = fetch_text(
            &self.http,
            ID,
            &url,
            &[("q", query), ("limit", "5"), ("appid", self.api_key.as_str())],
        )
        .await?;

        normalize_search(&body)
    }
}
