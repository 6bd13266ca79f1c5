//! Wind-drift trajectory integration
//!
//! Forward Euler in time: every step reads the descent rate and the wind at
//! the current altitude, drifts with the wind for one sample interval and
//! drops by rate × interval. The final step is shortened so the last point
//! lands exactly on the landing altitude.

use crate::descent::DescentParameters;
use crate::models::{Trajectory, TrajectoryPoint};
use crate::wind_profile::WindProfile;
use crate::{Result, SpotDriftError};
use tracing::{debug, instrument};

/// Default upper bound on integration steps
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// A step that would end within this many metres of the landing altitude
/// is treated as the landing step.
const ALTITUDE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryIntegrator {
    max_steps: usize,
}

impl Default for TrajectoryIntegrator {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl TrajectoryIntegrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_steps(max_steps: usize) -> Self {
        Self { max_steps }
    }

    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Integrate a descent from jump altitude to landing altitude
    #[instrument(
        name = "integrate_trajectory",
        level = "debug",
        skip_all,
        fields(jump = params.jump_altitude, landing = params.landing_altitude)
    )]
    pub fn integrate(
        &self,
        profile: &WindProfile,
        params: &DescentParameters,
    ) -> Result<Trajectory> {
        params.validate()?;
        if profile.is_empty() {
            return Err(SpotDriftError::NoData);
        }

        let interval = params.sample_interval;
        let landing = params.landing_altitude;
        let mut altitude = params.jump_altitude;
        let mut time = 0.0;
        let (mut east, mut north) = (0.0, 0.0);
        let mut points = Vec::new();

        while altitude > landing {
            if points.len() >= self.max_steps {
                return Err(SpotDriftError::StepLimit {
                    max_steps: self.max_steps,
                });
            }

            let rate = params.rate_at(altitude);
            if !(rate > 0.0) || !rate.is_finite() {
                return Err(SpotDriftError::InvalidDescentRate { altitude, rate });
            }
            let wind = profile.lookup(altitude)?;
            let phase = params.descent.phase_at(altitude);

            let remaining = altitude - landing;
            let drop = rate * interval;
            let (step, next_altitude) = if drop >= remaining - ALTITUDE_TOLERANCE {
                (remaining / rate, landing)
            } else {
                (interval, altitude - drop)
            };

            let (wind_east, wind_north) = wind.components();
            east += wind_east * step;
            north += wind_north * step;
            time += step;
            altitude = next_altitude;

            points.push(TrajectoryPoint {
                time_offset: time,
                altitude,
                east,
                north,
                phase,
            });
        }

        debug!(
            steps = points.len(),
            duration = time,
            east,
            north,
            "trajectory integrated"
        );
        Ok(Trajectory::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descent::{DescentModel, FreefallCanopy};
    use crate::models::{AltitudeBand, DescentPhase, WindVector};
    use chrono::Utc;
    use rstest::rstest;
    use std::sync::Arc;

    fn uniform_profile(speed: f64, direction: f64) -> WindProfile {
        let mut profile = WindProfile::new();
        profile
            .update(
                AltitudeBand::new(0.0, 10_000.0).unwrap(),
                WindVector::new(speed, direction),
                Utc::now(),
            )
            .unwrap();
        profile
    }

    fn constant(jump: f64, landing: f64, rate: f64, interval: f64) -> DescentParameters {
        DescentParameters::new(jump, landing, DescentModel::Constant { rate }, interval)
    }

    #[test]
    fn test_4000m_at_5ms_takes_800_steps() {
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(3.0, 45.0), &constant(4000.0, 0.0, 5.0, 1.0))
            .unwrap();
        assert_eq!(trajectory.len(), 800);
        let landing = trajectory.landing().unwrap();
        assert_eq!(landing.altitude, 0.0);
        assert_eq!(landing.time_offset, 800.0);
    }

    #[rstest]
    #[case(0.1)]
    #[case(0.3)]
    #[case(0.7)]
    #[case(1.0)]
    #[case(3.0)]
    #[case(7.0)]
    fn test_terminal_point_on_landing_altitude(#[case] interval: f64) {
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(4.0, 200.0), &constant(3000.0, 120.0, 6.0, interval))
            .unwrap();
        let landing = trajectory.landing().unwrap();
        assert!((landing.altitude - 120.0).abs() <= f64::EPSILON * 120.0);
        assert!((landing.time_offset - 480.0).abs() < 1e-6);
    }

    #[rstest]
    #[case(0.25)]
    #[case(1.0)]
    #[case(2.0)]
    fn test_time_increases_and_altitude_decreases(#[case] interval: f64) {
        let params = DescentParameters::new(
            4000.0,
            0.0,
            DescentModel::FreefallCanopy(FreefallCanopy {
                mass_kg: 90.0,
                drag_area_m2: 0.505,
                deploy_altitude: 900.0,
                canopy_rate: 5.0,
            }),
            interval,
        );
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(8.0, 120.0), &params)
            .unwrap();
        let points = trajectory.points();
        assert!(points[0].time_offset > 0.0);
        assert!(points[0].altitude < 4000.0);
        for pair in points.windows(2) {
            assert!(pair[1].time_offset > pair[0].time_offset);
            assert!(pair[1].altitude < pair[0].altitude);
        }
    }

    #[test]
    fn test_zero_wind_stays_on_jump_point() {
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(0.0, 270.0), &constant(2000.0, 0.0, 7.0, 0.5))
            .unwrap();
        assert!(trajectory.points().iter().all(|p| p.east == 0.0 && p.north == 0.0));
    }

    #[test]
    fn test_constant_wind_drift() {
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(5.0, 90.0), &constant(4000.0, 0.0, 5.0, 1.0))
            .unwrap();
        let landing = trajectory.landing().unwrap();
        assert!((landing.east - 4000.0).abs() < 1e-6);
        assert!(landing.north.abs() < 1e-6);
    }

    #[test]
    fn test_drift_follows_layers() {
        let mut profile = WindProfile::new();
        let now = Utc::now();
        profile
            .update(AltitudeBand::new(0.0, 1000.0).unwrap(), WindVector::new(2.0, 0.0), now)
            .unwrap();
        profile
            .update(AltitudeBand::new(1000.0, 2000.0).unwrap(), WindVector::new(4.0, 180.0), now)
            .unwrap();
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&profile, &constant(2000.0, 0.0, 10.0, 1.0))
            .unwrap();
        // steps from 2000 m to 1000 m see the upper band, 990 m and below the lower
        let landing = trajectory.landing().unwrap();
        assert!((landing.north - (-4.0 * 101.0 + 2.0 * 99.0)).abs() < 1e-6);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(1.0, 0.0), &constant(0.0, 100.0, 5.0, 1.0));
        assert!(matches!(result, Err(SpotDriftError::InvalidRange { .. })));
    }

    #[test]
    fn test_empty_profile_is_rejected() {
        let result = TrajectoryIntegrator::new()
            .integrate(&WindProfile::new(), &constant(4000.0, 0.0, 5.0, 1.0));
        assert!(matches!(result, Err(SpotDriftError::NoData)));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-2.0)]
    #[case(f64::NAN)]
    fn test_non_positive_rate_is_rejected(#[case] bad_rate: f64) {
        let params = DescentParameters::new(
            4000.0,
            0.0,
            DescentModel::Custom(Arc::new(move |altitude| {
                if altitude > 2000.0 { 50.0 } else { bad_rate }
            })),
            1.0,
        );
        let result = TrajectoryIntegrator::new().integrate(&uniform_profile(1.0, 0.0), &params);
        match result {
            Err(SpotDriftError::InvalidDescentRate { altitude, .. }) => assert!(altitude <= 2000.0),
            other => panic!("expected InvalidDescentRate, got {other:?}"),
        }
    }

    #[test]
    fn test_step_limit() {
        let result = TrajectoryIntegrator::with_max_steps(10)
            .integrate(&uniform_profile(1.0, 0.0), &constant(4000.0, 0.0, 5.0, 1.0));
        assert!(matches!(result, Err(SpotDriftError::StepLimit { max_steps: 10 })));
    }

    #[test]
    fn test_phases_switch_once() {
        let params = DescentParameters::new(
            4000.0,
            0.0,
            DescentModel::FreefallCanopy(FreefallCanopy {
                mass_kg: 90.0,
                drag_area_m2: 0.505,
                deploy_altitude: 1000.0,
                canopy_rate: 5.0,
            }),
            0.1,
        );
        let trajectory = TrajectoryIntegrator::new()
            .integrate(&uniform_profile(0.0, 0.0), &params)
            .unwrap();
        let phases: Vec<_> = trajectory.points().iter().map(|p| p.phase).collect();
        assert_eq!(phases.first(), Some(&Some(DescentPhase::Freefall)));
        assert_eq!(phases.last(), Some(&Some(DescentPhase::Canopy)));
        let switches = phases.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(switches, 1);
    }
}
