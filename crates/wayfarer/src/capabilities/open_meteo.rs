use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const GEOCODING_HOST: &str = "https://geocoding-api.open-meteo.com";
pub const FORECAST_HOST: &str = "https://api.open-meteo.com";

#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
    pub geocoding_host: String,
    pub forecast_host: String,
    pub timeout: Duration,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            geocoding_host: GEOCODING_HOST.to_string(),
            forecast_host: FORECAST_HOST.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl OpenMeteoConfig {
    /// Point both endpoints at the same host, used against a local stub
    pub fn with_host(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            geocoding_host: host.clone(),
            forecast_host: host,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions as reported by the feed. Temperature and wind speed stay
/// raw JSON values so they render exactly as the feed sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: Value,
    pub windspeed: Value,
    pub weathercode: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyConditions {
    pub date: String,
    pub high: Value,
    pub low: Value,
    pub weathercode: i64,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Value>,
    #[serde(default)]
    temperature_2m_min: Vec<Value>,
    #[serde(default)]
    weathercode: Vec<Value>,
}

fn weather_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|v| v as i64))
}

/// Thin client for the Open-Meteo geocoding and forecast endpoints
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    config: OpenMeteoConfig,
}

impl OpenMeteoClient {
    pub fn new(config: OpenMeteoConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn get(&self, url: String, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Resolve a place name to coordinates. Lookup failures are logged and
    /// reported as no match.
    pub async fn coordinates(&self, name: &str) -> Option<Coordinates> {
        let url = format!(
            "{}/v1/search",
            self.config.geocoding_host.trim_end_matches('/')
        );
        let query = [
            ("name", name.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let data = match self.get(url, &query).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Error fetching coordinates for {}: {}", name, e);
                return None;
            }
        };

        match serde_json::from_value::<GeocodingResponse>(data) {
            Ok(response) => response
                .results
                .and_then(|results| results.into_iter().next())
                .map(|first| Coordinates {
                    latitude: first.latitude,
                    longitude: first.longitude,
                }),
            Err(e) => {
                tracing::warn!("Unexpected geocoding payload for {}: {}", name, e);
                None
            }
        }
    }

    pub async fn current_weather(&self, at: &Coordinates) -> Result<CurrentConditions> {
        let url = format!(
            "{}/v1/forecast",
            self.config.forecast_host.trim_end_matches('/')
        );
        let query = [
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current_weather", "true".to_string()),
        ];
        let data = self.get(url, &query).await?;

        let current = data.get("current_weather").cloned().unwrap_or(Value::Null);
        Ok(CurrentConditions {
            temperature: current.get("temperature").cloned().unwrap_or(Value::Null),
            windspeed: current.get("windspeed").cloned().unwrap_or(Value::Null),
            weathercode: current
                .get("weathercode")
                .and_then(weather_code)
                .unwrap_or(0),
        })
    }

    pub async fn daily_forecast(&self, at: &Coordinates, days: i64) -> Result<Vec<DailyConditions>> {
        let url = format!(
            "{}/v1/forecast",
            self.config.forecast_host.trim_end_matches('/')
        );
        let query = [
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,weathercode".to_string(),
            ),
            ("timezone", "auto".to_string()),
            ("forecast_days", days.to_string()),
        ];
        let data = self.get(url, &query).await?;

        let daily: DailyBlock = match data.get("daily") {
            Some(block) => serde_json::from_value(block.clone())?,
            None => DailyBlock::default(),
        };

        daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| -> Result<DailyConditions> {
                let missing = |field: &str| anyhow!("daily data has no {} for {}", field, date);
                Ok(DailyConditions {
                    date: date.clone(),
                    high: daily
                        .temperature_2m_max
                        .get(i)
                        .cloned()
                        .ok_or_else(|| missing("temperature_2m_max"))?,
                    low: daily
                        .temperature_2m_min
                        .get(i)
                        .cloned()
                        .ok_or_else(|| missing("temperature_2m_min"))?,
                    weathercode: daily
                        .weathercode
                        .get(i)
                        .and_then(weather_code)
                        .ok_or_else(|| missing("weathercode"))?,
                })
            })
            .collect()
    }
}
