//! `OpenMeteo` winds aloft
//!
//! Pulls hourly wind speed and direction on the surface height levels and
//! the standard pressure levels up to 300 hPa, and turns the hour closest
//! to now into wind observations.

use super::WindSource;
use crate::SpotDriftError;
use crate::config::WindFeedConfig;
use crate::models::{Location, WindObservation, WindVector};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const FEET_TO_METERS: f64 = 0.3048;

/// An `OpenMeteo` level and the altitude it stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindLevel {
    /// Suffix of the `wind_speed_*` / `wind_direction_*` variables
    pub key: &'static str,
    pub altitude_ft: f64,
}

impl WindLevel {
    #[must_use]
    pub fn altitude_m(&self) -> f64 {
        self.altitude_ft * FEET_TO_METERS
    }
}

/// Levels requested from `OpenMeteo`, lowest first
pub const WIND_LEVELS: [WindLevel; 10] = [
    WindLevel { key: "10m", altitude_ft: 33.0 },
    WindLevel { key: "80m", altitude_ft: 262.0 },
    WindLevel { key: "100m", altitude_ft: 328.0 },
    WindLevel { key: "1000hPa", altitude_ft: 364.0 },
    WindLevel { key: "925hPa", altitude_ft: 2500.0 },
    WindLevel { key: "850hPa", altitude_ft: 4800.0 },
    WindLevel { key: "700hPa", altitude_ft: 9900.0 },
    WindLevel { key: "500hPa", altitude_ft: 18000.0 },
    WindLevel { key: "400hPa", altitude_ft: 23000.0 },
    WindLevel { key: "300hPa", altitude_ft: 30000.0 },
];

/// Forecast response, reduced to the hourly series
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub hourly: HourlyWinds,
}

#[derive(Debug, Deserialize)]
pub struct HourlyWinds {
    pub time: Vec<String>,
    /// `wind_speed_<level>` and `wind_direction_<level>` series
    #[serde(flatten)]
    pub series: HashMap<String, Vec<Option<f64>>>,
}

impl HourlyWinds {
    fn value(&self, variable: &str, index: usize) -> Option<f64> {
        self.series.get(variable)?.get(index).copied().flatten()
    }

    /// Index of the hourly slot closest to `now`
    fn closest_slot(&self, now: DateTime<Utc>) -> Option<(usize, DateTime<Utc>)> {
        self.time
            .iter()
            .enumerate()
            .filter_map(|(i, t)| {
                NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M")
                    .ok()
                    .map(|dt| (i, dt.and_utc()))
            })
            .min_by_key(|(_, t)| (*t - now).abs())
    }
}

impl ForecastResponse {
    /// Observations for the hour closest to `now`; levels with missing data are skipped
    pub fn observations(&self, now: DateTime<Utc>) -> Result<Vec<WindObservation>> {
        let (index, observed_at) = self
            .hourly
            .closest_slot(now)
            .ok_or_else(|| anyhow!("OpenMeteo response has no usable hourly timestamps"))?;

        let observations: Vec<WindObservation> = WIND_LEVELS
            .iter()
            .filter_map(|level| {
                let speed = self.hourly.value(&format!("wind_speed_{}", level.key), index);
                let direction = self.hourly.value(&format!("wind_direction_{}", level.key), index);
                match (speed, direction) {
                    (Some(speed), Some(direction)) => Some(WindObservation {
                        altitude: level.altitude_m(),
                        vector: WindVector::from_meteorological(speed, direction),
                        observed_at,
                    }),
                    _ => {
                        debug!(level = level.key, "no wind data for level");
                        None
                    }
                }
            })
            .collect();

        if observations.is_empty() {
            return Err(anyhow!("OpenMeteo response holds no wind levels for {observed_at}"));
        }
        Ok(observations)
    }
}

/// Winds aloft over one location from the `OpenMeteo` forecast API
#[derive(Clone)]
pub struct OpenMeteoWindSource {
    client: ClientWithMiddleware,
    base_url: String,
    location: Location,
}

impl OpenMeteoWindSource {
    pub fn new(config: &WindFeedConfig, location: Location) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .context("Failed to build HTTP client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            location,
        })
    }

    /// Forecast request URL for the configured location
    #[must_use]
    pub fn forecast_url(&self) -> String {
        let variables: Vec<String> = WIND_LEVELS
            .iter()
            .flat_map(|level| {
                [
                    format!("wind_speed_{}", level.key),
                    format!("wind_direction_{}", level.key),
                ]
            })
            .collect();
        format!(
            "{}/forecast?latitude={}&longitude={}&hourly={}&wind_speed_unit=ms&timezone=GMT",
            self.base_url,
            self.location.latitude,
            self.location.longitude,
            variables.join(",")
        )
    }
}

#[async_trait]
impl WindSource for OpenMeteoWindSource {
    fn name(&self) -> &str {
        "open-meteo"
    }

    #[instrument(name = "fetch_open_meteo", level = "debug", skip(self), fields(location = %self.location.name))]
    async fn fetch(&self) -> Result<Vec<WindObservation>> {
        let response = self
            .client
            .get(self.forecast_url())
            .send()
            .await
            .context("Failed to reach OpenMeteo")?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotDriftError::api(format!(
                "OpenMeteo rejected the forecast request with status {status}"
            ))
            .into());
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .context("Failed to parse OpenMeteo forecast response")?;
        debug!(
            latitude = forecast.latitude,
            longitude = forecast.longitude,
            "forecast grid point"
        );

        forecast.observations(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RESPONSE: &str = r#"{
        "latitude": 39.7,
        "longitude": -75.04,
        "generationtime_ms": 0.5,
        "hourly_units": {"time": "iso8601", "wind_speed_10m": "m/s"},
        "hourly": {
            "time": ["2025-06-01T11:00", "2025-06-01T12:00", "2025-06-01T13:00"],
            "wind_speed_10m": [1.0, 2.0, 3.0],
            "wind_direction_10m": [270.0, 280.0, 290.0],
            "wind_speed_925hPa": [5.0, 6.0, null],
            "wind_direction_925hPa": [250.0, 260.0, 270.0],
            "wind_speed_300hPa": [30.0, 31.0, 32.0],
            "wind_direction_300hPa": [0.0, 10.0, 20.0]
        }
    }"#;

    fn response() -> ForecastResponse {
        serde_json::from_str(RESPONSE).unwrap()
    }

    #[test]
    fn test_picks_closest_hour() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 20, 0).unwrap();
        let observations = response().observations(now).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].vector.speed(), 2.0);
        assert_eq!(
            observations[0].observed_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_levels_map_to_metres_and_drift_bearing() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();
        let observations = response().observations(now).unwrap();
        assert!((observations[0].altitude - 33.0 * 0.3048).abs() < 1e-9);
        // wind from the west drifts east
        assert_eq!(observations[0].vector.direction(), 90.0);
        assert!((observations[2].altitude - 30000.0 * 0.3048).abs() < 1e-9);
        assert_eq!(observations[2].vector.direction(), 180.0);
    }

    #[test]
    fn test_reports_grid_point() {
        let forecast = response();
        assert_eq!(forecast.latitude, 39.7);
        assert_eq!(forecast.longitude, -75.04);
    }

    #[test]
    fn test_missing_values_skip_level() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap();
        let observations = response().observations(now).unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.altitude != 2500.0 * 0.3048));
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"latitude": 0.0, "longitude": 0.0, "hourly": {"time": ["2025-06-01T11:00"]}}"#,
        )
        .unwrap();
        assert!(response.observations(Utc::now()).is_err());
    }

    #[test]
    fn test_forecast_url() {
        let config = WindFeedConfig::default();
        let source =
            OpenMeteoWindSource::new(&config, Location::new(39.7, -75.0, "DZ".to_string())).unwrap();
        let url = source.forecast_url();
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=39.7&longitude=-75"));
        assert!(url.contains("wind_speed_850hPa,wind_direction_850hPa"));
        assert!(url.contains("wind_speed_unit=ms"));
    }
}
