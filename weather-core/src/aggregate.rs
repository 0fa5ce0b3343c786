//! Combining per-provider readings into one response.

use crate::model::{CurrentConditions, ForecastRecord, WeatherRecord, timestamp_now};

pub const AGGREGATED_CONDITION: &str = "Aggregated";
pub const AGGREGATED_DESCRIPTION: &str = "Real-time data from multiple sources";

/// Average two current-weather records field by field.
///
/// The location comes from `first`. Integer fields use truncating integer
/// division, so `65 + 80` averages to `72`. Sources keep fetch order.
pub fn aggregate_current(first: WeatherRecord, second: WeatherRecord) -> WeatherRecord {
    let a = &first.current;
    let b = &second.current;

    let current = CurrentConditions {
        temperature: (a.temperature + b.temperature) / 2.0,
        feels_like: (a.feels_like + b.feels_like) / 2.0,
        humidity: (a.humidity + b.humidity) / 2,
        pressure: (a.pressure + b.pressure) / 2,
        wind_speed: (a.wind_speed + b.wind_speed) / 2.0,
        condition: AGGREGATED_CONDITION.to_string(),
        description: AGGREGATED_DESCRIPTION.to_string(),
    };

    let mut sources = first.sources;
    sources.extend(second.sources);

    WeatherRecord {
        location: first.location,
        current,
        sources,
        last_updated: timestamp_now(),
    }
}

/// Keep at most `days` entries of a single-provider forecast, in order.
pub fn limit_forecast(mut record: ForecastRecord, days: u8) -> ForecastRecord {
    record.forecast.truncate(usize::from(days));
    record
}
