//! Exit spotting
//!
//! Turns a drift trajectory computed from directly over the target into an
//! exit point upwind of it, plus the glide circle a gliding canopy could
//! still reach from there.

use crate::descent::{DescentModel, DescentParameters};
use crate::models::{Location, Trajectory};
use crate::{Result, SpotDriftError};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPlan {
    /// Metres east of the target to exit at
    pub exit_east: f64,
    /// Metres north of the target to exit at
    pub exit_north: f64,
    /// Total wind drift from exit to landing, metres
    pub drift: f64,
    /// Seconds from exit to landing
    pub descent_time: f64,
    /// Seconds under canopy, when the descent model has a deployment
    pub canopy_time: Option<f64>,
    /// Horizontal distance the canopy can cover, metres
    pub glide_radius: Option<f64>,
}

impl SpotPlan {
    /// Plan the exit for a trajectory integrated from a jump point over the target
    pub fn from_trajectory(
        trajectory: &Trajectory,
        params: &DescentParameters,
        canopy_horizontal_speed: f64,
    ) -> Result<Self> {
        if trajectory.is_empty() {
            return Err(SpotDriftError::validation("cannot spot an empty trajectory"));
        }
        let (exit_east, exit_north) = trajectory.exit_offset();

        let canopy_time = match &params.descent {
            DescentModel::FreefallCanopy(model) => {
                let canopy_height = model
                    .deploy_altitude
                    .min(params.jump_altitude)
                    - params.landing_altitude;
                (canopy_height > 0.0 && model.canopy_rate > 0.0)
                    .then(|| canopy_height / model.canopy_rate)
            }
            _ => None,
        };
        let glide_radius = canopy_time.map(|t| t * canopy_horizontal_speed.max(0.0));

        Ok(Self {
            exit_east,
            exit_north,
            drift: trajectory.total_drift(),
            descent_time: trajectory.duration(),
            canopy_time,
            glide_radius,
        })
    }

    /// Exit point relative to the target location
    #[must_use]
    pub fn exit_location(&self, target: &Location) -> Location {
        let mut exit = target.offset(self.exit_east, self.exit_north);
        exit.name = format!("Exit for {}", target.name);
        exit
    }

    /// Trajectory moved so it starts at the exit point, in metres from the target
    #[must_use]
    pub fn track_from_exit(&self, trajectory: &Trajectory) -> Trajectory {
        trajectory.shifted(self.exit_east, self.exit_north)
    }

    /// `resolution` points on the glide circle around the exit point,
    /// as (east, north) metres from the target
    #[must_use]
    pub fn glide_circle(&self, resolution: usize) -> Vec<(f64, f64)> {
        let Some(radius) = self.glide_radius else {
            return Vec::new();
        };
        (0..resolution)
            .map(|i| {
                let theta = TAU * i as f64 / resolution as f64;
                (
                    self.exit_east + radius * theta.sin(),
                    self.exit_north + radius * theta.cos(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descent::FreefallCanopy;
    use crate::integrator::TrajectoryIntegrator;
    use crate::models::{AltitudeBand, WindVector};
    use crate::wind_profile::WindProfile;
    use chrono::Utc;

    fn westerly_profile() -> WindProfile {
        let mut profile = WindProfile::new();
        profile
            .update(
                AltitudeBand::new(0.0, 5000.0).unwrap(),
                WindVector::new(4.0, 90.0),
                Utc::now(),
            )
            .unwrap();
        profile
    }

    fn canopy_params() -> DescentParameters {
        DescentParameters::new(
            3962.4,
            0.0,
            DescentModel::FreefallCanopy(FreefallCanopy {
                mass_kg: 90.0,
                drag_area_m2: 0.505,
                deploy_altitude: 914.4,
                canopy_rate: 2.4384,
            }),
            0.1,
        )
    }

    #[test]
    fn test_exit_is_upwind_of_target() {
        let params = DescentParameters::new(2000.0, 0.0, DescentModel::Constant { rate: 5.0 }, 1.0);
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&westerly_profile(), &params)
            .unwrap();
        let plan = SpotPlan::from_trajectory(&trajectory, &params, 7.0).unwrap();
        assert!((plan.exit_east + 1600.0).abs() < 1e-6);
        assert!(plan.exit_north.abs() < 1e-6);
        assert_eq!(plan.canopy_time, None);
        assert!(plan.glide_circle(16).is_empty());

        let corrected = plan.track_from_exit(&trajectory);
        let landing = corrected.landing().unwrap();
        assert!(landing.east.abs() < 1e-6 && landing.north.abs() < 1e-6);
    }

    #[test]
    fn test_glide_radius_from_canopy_time() {
        let params = canopy_params();
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&westerly_profile(), &params)
            .unwrap();
        let plan = SpotPlan::from_trajectory(&trajectory, &params, 7.3152).unwrap();
        let canopy_time = plan.canopy_time.unwrap();
        assert!((canopy_time - 375.0).abs() < 1e-9);
        assert!((plan.glide_radius.unwrap() - 375.0 * 7.3152).abs() < 1e-6);

        let circle = plan.glide_circle(4);
        assert_eq!(circle.len(), 4);
        let (east, north) = circle[0];
        assert!((east - plan.exit_east).abs() < 1e-9);
        assert!((north - plan.exit_north - plan.glide_radius.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_exit_location_name() {
        let params = DescentParameters::new(1000.0, 0.0, DescentModel::Constant { rate: 5.0 }, 1.0);
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&westerly_profile(), &params)
            .unwrap();
        let plan = SpotPlan::from_trajectory(&trajectory, &params, 0.0).unwrap();
        let target = Location::new(39.7, -75.0, "Cross Keys".to_string());
        let exit = plan.exit_location(&target);
        assert_eq!(exit.name, "Exit for Cross Keys");
        assert!(exit.longitude < target.longitude);
    }
}
