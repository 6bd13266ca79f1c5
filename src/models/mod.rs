//! Data models for the SpotDrift engine
//!
//! This module contains the core domain models organized by concern:
//! - Wind: wind vectors, altitude bands and observations
//! - Trajectory: integrated ground-track points
//! - Location: drop zone coordinates and geographic projection

pub mod location;
pub mod trajectory;
pub mod wind;

// Re-export all public types for convenient access
pub use location::{GeoPoint, Location};
pub use trajectory::{DescentPhase, Trajectory, TrajectoryPoint};
pub use wind::{AltitudeBand, BandEntry, WindObservation, WindVector};
