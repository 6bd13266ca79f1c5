//! Error types and handling for the `SpotDrift` trajectory engine

use thiserror::Error;

/// Main error type for the `SpotDrift` library
#[derive(Error, Debug)]
pub enum SpotDriftError {
    /// The wind profile holds no bands at all
    #[error("No wind data: the wind profile is empty")]
    NoData,

    /// The descent-rate function produced a non-positive (or non-finite) speed
    #[error("Invalid descent rate {rate} m/s at altitude {altitude} m")]
    InvalidDescentRate { altitude: f64, rate: f64 },

    /// Jump altitude is not above landing altitude
    #[error("Invalid altitude range: jump altitude {jump} m must be above landing altitude {landing} m")]
    InvalidRange { jump: f64, landing: f64 },

    /// Integration time step is not a positive finite number
    #[error("Invalid sample interval {interval} s: must be positive")]
    InvalidSampleInterval { interval: f64 },

    /// Altitude band bounds are not a finite, non-empty interval
    #[error("Invalid altitude band [{low}, {high})")]
    InvalidBand { low: f64, high: f64 },

    /// The integrator gave up after too many steps
    #[error("Integration exceeded {max_steps} steps")]
    StepLimit { max_steps: usize },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Wind feed communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SpotDriftError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for errors caused by the descent parameters rather than by wind data
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            SpotDriftError::InvalidDescentRate { .. }
                | SpotDriftError::InvalidRange { .. }
                | SpotDriftError::InvalidSampleInterval { .. }
                | SpotDriftError::StepLimit { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SpotDriftError::NoData => {
                "No wind data available yet. Load a wind table or check the wind feed.".to_string()
            }
            SpotDriftError::InvalidDescentRate { altitude, .. } => {
                format!("The descent model does not descend at {altitude:.0} m. Check the descent settings.")
            }
            SpotDriftError::InvalidRange { .. } => {
                "Jump altitude must be above landing altitude.".to_string()
            }
            SpotDriftError::InvalidSampleInterval { .. } => {
                "Sample interval must be a positive number of seconds.".to_string()
            }
            SpotDriftError::InvalidBand { low, high } => {
                format!("Wind band [{low}, {high}) is not a valid altitude range.")
            }
            SpotDriftError::StepLimit { .. } => {
                "Descent takes too many steps. Increase the sample interval or the descent rate."
                    .to_string()
            }
            SpotDriftError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SpotDriftError::Api { .. } => {
                "Unable to fetch winds aloft. Please check your internet connection.".to_string()
            }
            SpotDriftError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SpotDriftError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
