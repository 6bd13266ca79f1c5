//! `SpotDrift` - Skydiver wind-drift trajectories and exit spotting
//!
//! This library integrates a jumper's descent through a layered wind profile,
//! keeps the result fresh as winds aloft and jump parameters change, and
//! turns the drift into an exit point over the landing target.

pub mod config;
pub mod descent;
pub mod error;
pub mod integrator;
pub mod models;
pub mod session;
pub mod spotting;
pub mod telemetry;
pub mod weather;
pub mod wind_profile;

// Re-export core types for public API
pub use config::SpotDriftConfig;
pub use descent::{DescentModel, DescentParameters, FreefallCanopy, RateTable};
pub use error::SpotDriftError;
pub use integrator::TrajectoryIntegrator;
pub use models::{
    AltitudeBand, DescentPhase, GeoPoint, Location, Trajectory, TrajectoryPoint, WindObservation,
    WindVector,
};
pub use session::{SessionHandle, TrajectorySession};
pub use spotting::SpotPlan;
pub use weather::{OpenMeteoWindSource, TableWindSource, WindSource};
pub use wind_profile::WindProfile;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SpotDriftError>;
