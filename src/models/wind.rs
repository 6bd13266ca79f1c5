//! Wind vector and altitude band models

use crate::{Result, SpotDriftError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrap a bearing in degrees into `[0, 360)`
#[must_use]
pub fn normalize_direction(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]` degrees
#[must_use]
pub fn angular_difference(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Horizontal wind as speed and compass bearing.
///
/// The bearing is the direction the air (and a drifting skydiver) moves
/// towards: 0° = north, clockwise positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindVector {
    /// Wind speed in m/s, never negative
    speed: f64,
    /// Drift bearing in degrees, `[0, 360)`
    direction: f64,
}

impl WindVector {
    /// Create a wind vector, wrapping the direction into `[0, 360)`.
    ///
    /// A negative speed is folded into the opposite bearing.
    #[must_use]
    pub fn new(speed: f64, direction: f64) -> Self {
        if speed < 0.0 {
            Self {
                speed: -speed,
                direction: normalize_direction(direction + 180.0),
            }
        } else {
            Self {
                speed,
                direction: normalize_direction(direction),
            }
        }
    }

    /// Create a wind vector from a meteorological "wind from" bearing
    #[must_use]
    pub fn from_meteorological(speed: f64, from_direction: f64) -> Self {
        Self::new(speed, from_direction + 180.0)
    }

    /// No wind
    #[must_use]
    pub fn calm() -> Self {
        Self {
            speed: 0.0,
            direction: 0.0,
        }
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.speed.is_finite() && self.direction.is_finite()
    }

    /// East and north components in m/s
    #[must_use]
    pub fn components(&self) -> (f64, f64) {
        let radians = self.direction.to_radians();
        (self.speed * radians.sin(), self.speed * radians.cos())
    }

    /// Interpolate towards `other` by `fraction` in `[0, 1]`.
    ///
    /// Speed is linear; direction follows the shorter arc so 350° and 10°
    /// meet at 0°, not 180°.
    #[must_use]
    pub fn interpolate(&self, other: &WindVector, fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let speed = self.speed + (other.speed - self.speed) * fraction;
        let direction =
            self.direction + angular_difference(self.direction, other.direction) * fraction;
        Self::new(speed, direction)
    }

    /// Cardinal name of the drift bearing (N, NNE, ...)
    #[must_use]
    pub fn cardinal(&self) -> &'static str {
        const POINTS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W",
            "WNW", "NW", "NNW",
        ];
        let index = ((self.direction / 22.5) + 0.5).floor() as usize % POINTS.len();
        POINTS[index]
    }

    /// Format wind information
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{:.1} m/s towards {:03.0}° ({})",
            self.speed,
            self.direction,
            self.cardinal()
        )
    }
}

/// Half-open altitude interval `[low, high)` in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeBand {
    low: f64,
    high: f64,
}

impl AltitudeBand {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(SpotDriftError::InvalidBand { low, high });
        }
        Ok(Self { low, high })
    }

    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    #[must_use]
    pub fn contains(&self, altitude: f64) -> bool {
        altitude >= self.low && altitude < self.high
    }

    #[must_use]
    pub fn overlaps(&self, other: &AltitudeBand) -> bool {
        self.low < other.high && other.low < self.high
    }
}

/// A band's wind vector together with the time it was recorded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEntry {
    pub band: AltitudeBand,
    pub vector: WindVector,
    pub updated_at: DateTime<Utc>,
}

/// A single wind reading at one altitude, as delivered by a wind source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindObservation {
    /// Altitude above the landing reference in metres
    pub altitude: f64,
    pub vector: WindVector,
    pub observed_at: DateTime<Utc>,
}

impl WindObservation {
    /// Band `[altitude, altitude + thickness)` covered by this reading
    pub fn band(&self, thickness: f64) -> Result<AltitudeBand> {
        AltitudeBand::new(self.altitude, self.altitude + thickness)
    }
}
