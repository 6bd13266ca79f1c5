//! Configuration management for `SpotDrift`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SpotDriftError;
use crate::descent::{DescentModel, DescentParameters, FreefallCanopy, RateTable};
use crate::integrator::{DEFAULT_MAX_STEPS, TrajectoryIntegrator};
use crate::models::Location;
use crate::weather::DirectionConvention;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `SpotDrift`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotDriftConfig {
    /// Jump and descent settings
    #[serde(default)]
    pub descent: DescentConfig,
    /// Wind feed settings
    #[serde(default)]
    pub wind: WindFeedConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Landing target
    #[serde(default)]
    pub target: TargetConfig,
}

/// Which descent-rate function to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescentModelKind {
    /// `rate_ms` everywhere
    Constant,
    /// Interpolated `table`
    Table,
    /// Terminal-velocity freefall down to `deploy_altitude_m`, then canopy
    Freefall,
}

/// Jump and descent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescentConfig {
    /// Exit altitude in metres
    #[serde(default = "default_jump_altitude")]
    pub jump_altitude_m: f64,
    /// Landing area altitude in metres
    #[serde(default)]
    pub landing_altitude_m: f64,
    #[serde(default = "default_descent_model")]
    pub model: DescentModelKind,
    /// Vertical speed for the constant model, m/s
    #[serde(default = "default_constant_rate")]
    pub rate_ms: f64,
    /// (altitude m, rate m/s) rows for the table model
    #[serde(default)]
    pub table: Vec<[f64; 2]>,
    #[serde(default = "default_mass")]
    pub mass_kg: f64,
    /// Drag coefficient times area, m²
    #[serde(default = "default_drag_area")]
    pub drag_area_m2: f64,
    #[serde(default = "default_deploy_altitude")]
    pub deploy_altitude_m: f64,
    /// Vertical speed under canopy, m/s
    #[serde(default = "default_canopy_rate")]
    pub canopy_rate_ms: f64,
    /// Forward speed under canopy for the glide circle, m/s
    #[serde(default = "default_canopy_horizontal_speed")]
    pub canopy_horizontal_speed_ms: f64,
    /// Integration time step in seconds
    #[serde(default = "default_sample_interval")]
    pub sample_interval_s: f64,
    /// Upper bound on integration steps
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

/// Wind feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindFeedConfig {
    /// Base URL for the `OpenMeteo` API
    #[serde(default = "default_wind_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_wind_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_wind_max_retries")]
    pub max_retries: u32,
    /// Seconds between wind refreshes when watching
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Altitude band covered by each point observation, metres
    #[serde(default = "default_band_thickness")]
    pub band_thickness_m: f64,
    /// Direction convention of manual wind tables
    #[serde(default)]
    pub table_direction: DirectionConvention,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Landing target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_latitude")]
    pub latitude: f64,
    #[serde(default = "default_target_longitude")]
    pub longitude: f64,
    #[serde(default = "default_target_name")]
    pub name: String,
}

// Default value functions
fn default_jump_altitude() -> f64 {
    3962.4 // 13 000 ft
}

fn default_descent_model() -> DescentModelKind {
    DescentModelKind::Freefall
}

fn default_constant_rate() -> f64 {
    5.0
}

fn default_mass() -> f64 {
    90.0
}

fn default_drag_area() -> f64 {
    0.505
}

fn default_deploy_altitude() -> f64 {
    914.4 // 3 000 ft
}

fn default_canopy_rate() -> f64 {
    2.4384 // 8 ft/s
}

fn default_canopy_horizontal_speed() -> f64 {
    7.3152 // 24 ft/s
}

fn default_sample_interval() -> f64 {
    0.1
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_wind_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_wind_timeout() -> u32 {
    30
}

fn default_wind_max_retries() -> u32 {
    3
}

fn default_refresh_interval() -> u64 {
    900
}

fn default_band_thickness() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_target_latitude() -> f64 {
    39.706_561_4
}

fn default_target_longitude() -> f64 {
    -75.035_218_1
}

fn default_target_name() -> String {
    "Drop zone".to_string()
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            jump_altitude_m: default_jump_altitude(),
            landing_altitude_m: 0.0,
            model: default_descent_model(),
            rate_ms: default_constant_rate(),
            table: Vec::new(),
            mass_kg: default_mass(),
            drag_area_m2: default_drag_area(),
            deploy_altitude_m: default_deploy_altitude(),
            canopy_rate_ms: default_canopy_rate(),
            canopy_horizontal_speed_ms: default_canopy_horizontal_speed(),
            sample_interval_s: default_sample_interval(),
            max_steps: default_max_steps(),
        }
    }
}

impl Default for WindFeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_wind_base_url(),
            timeout_seconds: default_wind_timeout(),
            max_retries: default_wind_max_retries(),
            refresh_interval_seconds: default_refresh_interval(),
            band_thickness_m: default_band_thickness(),
            table_direction: DirectionConvention::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            latitude: default_target_latitude(),
            longitude: default_target_longitude(),
            name: default_target_name(),
        }
    }
}

impl DescentConfig {
    /// Build the integrator's descent parameters
    pub fn to_descent_parameters(&self) -> crate::Result<DescentParameters> {
        let descent = match self.model {
            DescentModelKind::Constant => DescentModel::Constant { rate: self.rate_ms },
            DescentModelKind::Table => DescentModel::Table(RateTable::new(
                self.table.iter().map(|&[altitude, rate]| (altitude, rate)).collect(),
            )?),
            DescentModelKind::Freefall => DescentModel::FreefallCanopy(FreefallCanopy {
                mass_kg: self.mass_kg,
                drag_area_m2: self.drag_area_m2,
                deploy_altitude: self.deploy_altitude_m,
                canopy_rate: self.canopy_rate_ms,
            }),
        };
        let params = DescentParameters::new(
            self.jump_altitude_m,
            self.landing_altitude_m,
            descent,
            self.sample_interval_s,
        );
        params.validate()?;
        Ok(params)
    }

    #[must_use]
    pub fn integrator(&self) -> TrajectoryIntegrator {
        TrajectoryIntegrator::with_max_steps(self.max_steps)
    }
}

impl TargetConfig {
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.name.clone())
    }
}

impl SpotDriftConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SPOTDRIFT_DESCENT__JUMP_ALTITUDE_M
        builder = builder.add_source(
            Environment::with_prefix("SPOTDRIFT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SpotDriftConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spotdrift").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.wind.base_url.is_empty() {
            self.wind.base_url = default_wind_base_url();
        }
        if self.wind.timeout_seconds == 0 {
            self.wind.timeout_seconds = default_wind_timeout();
        }
        if self.wind.refresh_interval_seconds == 0 {
            self.wind.refresh_interval_seconds = default_refresh_interval();
        }
        if self.descent.max_steps == 0 {
            self.descent.max_steps = default_max_steps();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_descent()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the descent settings by building the parameters
    fn validate_descent(&self) -> Result<()> {
        self.descent
            .to_descent_parameters()
            .map(|_| ())
            .map_err(|e| SpotDriftError::config(format!("Invalid descent settings: {e}")).into())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.descent.sample_interval_s > 60.0 {
            return Err(SpotDriftError::config("Sample interval cannot exceed 60 seconds").into());
        }

        if !(self.wind.band_thickness_m > 0.0) {
            return Err(SpotDriftError::config("Wind band thickness must be positive").into());
        }

        if self.wind.timeout_seconds > 300 {
            return Err(SpotDriftError::config("Wind API timeout cannot exceed 300 seconds").into());
        }

        if self.wind.max_retries > 10 {
            return Err(SpotDriftError::config("Wind API max retries cannot exceed 10").into());
        }

        if !(-90.0..=90.0).contains(&self.target.latitude)
            || !(-180.0..=180.0).contains(&self.target.longitude)
        {
            return Err(SpotDriftError::config(format!(
                "Target coordinates out of range: {}, {}",
                self.target.latitude, self.target.longitude
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SpotDriftError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SpotDriftError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.wind.base_url.starts_with("http://") && !self.wind.base_url.starts_with("https://")
        {
            return Err(
                SpotDriftError::config("Wind API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }
}
