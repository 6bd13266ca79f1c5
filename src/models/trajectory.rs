//! Trajectory models produced by the integrator

use super::location::{GeoPoint, Location};
use serde::{Deserialize, Serialize};

/// Which part of the jump a trajectory point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescentPhase {
    Freefall,
    Canopy,
}

/// One sample of the ground track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Seconds since exit
    pub time_offset: f64,
    /// Altitude in metres
    pub altitude: f64,
    /// Metres east of the jump point
    pub east: f64,
    /// Metres north of the jump point
    pub north: f64,
    /// Descent phase of the step that produced this point, if the model has phases
    pub phase: Option<DescentPhase>,
}

impl TrajectoryPoint {
    /// Horizontal distance from the jump point in metres
    #[must_use]
    pub fn ground_distance(&self) -> f64 {
        self.east.hypot(self.north)
    }
}

/// Ordered ground track from exit to landing.
///
/// Points are strictly increasing in time and strictly decreasing in
/// altitude; the last point sits on the landing altitude. The jump point
/// itself (time 0, offset 0/0) is implicit and not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub(crate) fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Terminal point on the landing altitude
    #[must_use]
    pub fn landing(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Time from exit to landing in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.landing().map_or(0.0, |p| p.time_offset)
    }

    /// Distance between jump point and landing point in metres
    #[must_use]
    pub fn total_drift(&self) -> f64 {
        self.landing().map_or(0.0, TrajectoryPoint::ground_distance)
    }

    /// Offset (east, north) of the exit point that puts the landing on the target
    #[must_use]
    pub fn exit_offset(&self) -> (f64, f64) {
        self.landing().map_or((0.0, 0.0), |p| (-p.east, -p.north))
    }

    /// Copy of this trajectory with every ground offset moved by (east, north)
    #[must_use]
    pub fn shifted(&self, east: f64, north: f64) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| TrajectoryPoint {
                east: p.east + east,
                north: p.north + north,
                ..*p
            })
            .collect();
        Self { points }
    }

    /// Project the ground track onto latitude/longitude around `origin`
    #[must_use]
    pub fn to_geo(&self, origin: &Location) -> Vec<GeoPoint> {
        self.points
            .iter()
            .map(|p| {
                let position = origin.offset(p.east, p.north);
                GeoPoint {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    altitude: p.altitude,
                    time_offset: p.time_offset,
                }
            })
            .collect()
    }
}
