//! Trajectory session
//!
//! A session owns one wind profile and the current descent parameters and
//! hands out the latest trajectory, recomputing it only after an input
//! changed. All mutation goes through `&mut self`, so an integration run
//! always sees one consistent profile state. [`SessionHandle`] shares a
//! session between a wind feed and a display loop running on their own
//! schedules.

use crate::descent::DescentParameters;
use crate::integrator::TrajectoryIntegrator;
use crate::models::{AltitudeBand, Trajectory, WindObservation, WindVector};
use crate::wind_profile::WindProfile;
use crate::{Result, SpotDriftError};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};

#[derive(Debug)]
pub struct TrajectorySession {
    profile: WindProfile,
    params: Option<DescentParameters>,
    integrator: TrajectoryIntegrator,
    cached: Option<Arc<Trajectory>>,
    dirty: bool,
    runs: u64,
}

impl Default for TrajectorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectorySession {
    /// Session with an empty wind profile and no descent parameters
    #[must_use]
    pub fn new() -> Self {
        Self::with_integrator(TrajectoryIntegrator::default())
    }

    #[must_use]
    pub fn with_integrator(integrator: TrajectoryIntegrator) -> Self {
        Self {
            profile: WindProfile::new(),
            params: None,
            integrator,
            cached: None,
            dirty: true,
            runs: 0,
        }
    }

    /// Record new wind for `band` and invalidate the cached trajectory
    pub fn on_wind_update(
        &mut self,
        band: AltitudeBand,
        vector: WindVector,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.profile.update(band, vector, timestamp)?;
        self.dirty = true;
        Ok(())
    }

    /// Record a batch of point observations, each covering `band_thickness` metres.
    ///
    /// The batch is applied as a whole: if any observation is rejected the
    /// profile is left as it was. Returns the number recorded.
    pub fn on_wind_observations(
        &mut self,
        observations: &[WindObservation],
        band_thickness: f64,
    ) -> Result<usize> {
        let mut profile = self.profile.clone();
        for observation in observations {
            let outcome = observation.band(band_thickness).and_then(|band| {
                profile.update(band, observation.vector, observation.observed_at)
            });
            if let Err(e) = outcome {
                warn!(altitude = observation.altitude, "rejected wind observation batch: {e}");
                return Err(e);
            }
        }
        if observations.is_empty() {
            return Ok(0);
        }
        self.profile = profile;
        self.dirty = true;
        debug!(count = observations.len(), "wind observations recorded");
        Ok(observations.len())
    }

    /// Replace the descent parameters.
    ///
    /// Parameters with an invalid altitude range or time step are rejected
    /// and the previous parameters (and cached trajectory) stay in place.
    pub fn on_parameters_changed(&mut self, params: DescentParameters) -> Result<()> {
        if let Err(e) = params.validate() {
            warn!("rejected descent parameters: {e}");
            return Err(e);
        }
        self.params = Some(params);
        self.dirty = true;
        Ok(())
    }

    /// Latest trajectory, recomputed if wind or parameters changed since the last run.
    ///
    /// On failure the error is returned and the last good trajectory stays
    /// available through [`TrajectorySession::last_good_trajectory`].
    #[instrument(name = "current_trajectory", level = "debug", skip(self))]
    pub fn current_trajectory(&mut self) -> Result<Arc<Trajectory>> {
        if !self.dirty {
            if let Some(cached) = &self.cached {
                return Ok(Arc::clone(cached));
            }
        }

        let params = self
            .params
            .as_ref()
            .ok_or_else(|| SpotDriftError::config("no descent parameters configured"))?;

        match self.integrator.integrate(&self.profile, params) {
            Ok(trajectory) => {
                let trajectory = Arc::new(trajectory);
                self.cached = Some(Arc::clone(&trajectory));
                self.dirty = false;
                self.runs += 1;
                debug!(run = self.runs, points = trajectory.len(), "trajectory recomputed");
                Ok(trajectory)
            }
            Err(e) => {
                warn!("trajectory integration failed: {e}");
                Err(e)
            }
        }
    }

    /// Most recent successfully computed trajectory, even if inputs changed since
    #[must_use]
    pub fn last_good_trajectory(&self) -> Option<Arc<Trajectory>> {
        self.cached.clone()
    }

    #[must_use]
    pub fn profile(&self) -> &WindProfile {
        &self.profile
    }

    #[must_use]
    pub fn parameters(&self) -> Option<&DescentParameters> {
        self.params.as_ref()
    }

    /// True when the next `current_trajectory` call will integrate
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.cached.is_none()
    }

    /// Number of successful integration runs
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// Cloneable, thread-safe handle to one [`TrajectorySession`]
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<TrajectorySession>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(session: TrajectorySession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    // session state is only ever replaced whole, so a poisoned lock still guards consistent data
    fn lock(&self) -> MutexGuard<'_, TrajectorySession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_wind_update(
        &self,
        band: AltitudeBand,
        vector: WindVector,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.lock().on_wind_update(band, vector, timestamp)
    }

    pub fn on_wind_observations(
        &self,
        observations: &[WindObservation],
        band_thickness: f64,
    ) -> Result<usize> {
        self.lock().on_wind_observations(observations, band_thickness)
    }

    pub fn on_parameters_changed(&self, params: DescentParameters) -> Result<()> {
        self.lock().on_parameters_changed(params)
    }

    pub fn current_trajectory(&self) -> Result<Arc<Trajectory>> {
        self.lock().current_trajectory()
    }

    #[must_use]
    pub fn last_good_trajectory(&self) -> Option<Arc<Trajectory>> {
        self.lock().last_good_trajectory()
    }

    /// Run `f` with shared access to the session
    pub fn inspect<T>(&self, f: impl FnOnce(&TrajectorySession) -> T) -> T {
        f(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descent::DescentModel;
    use std::thread;

    fn band(low: f64, high: f64) -> AltitudeBand {
        AltitudeBand::new(low, high).unwrap()
    }

    fn params(jump: f64) -> DescentParameters {
        DescentParameters::new(jump, 0.0, DescentModel::Constant { rate: 5.0 }, 1.0)
    }

    fn ready_session() -> TrajectorySession {
        let mut session = TrajectorySession::new();
        session
            .on_wind_update(band(0.0, 5000.0), WindVector::new(3.0, 90.0), Utc::now())
            .unwrap();
        session.on_parameters_changed(params(4000.0)).unwrap();
        session
    }

    #[test]
    fn test_requires_parameters() {
        let mut session = TrajectorySession::new();
        session
            .on_wind_update(band(0.0, 100.0), WindVector::calm(), Utc::now())
            .unwrap();
        assert!(matches!(
            session.current_trajectory(),
            Err(SpotDriftError::Config { .. })
        ));
    }

    #[test]
    fn test_requires_wind() {
        let mut session = TrajectorySession::new();
        session.on_parameters_changed(params(4000.0)).unwrap();
        assert!(matches!(session.current_trajectory(), Err(SpotDriftError::NoData)));
    }

    #[test]
    fn test_result_is_memoized() {
        let mut session = ready_session();
        let first = session.current_trajectory().unwrap();
        let second = session.current_trajectory().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(session.runs(), 1);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_wind_update_supersedes_trajectory() {
        let mut session = ready_session();
        let before = session.current_trajectory().unwrap();
        session
            .on_wind_update(band(0.0, 5000.0), WindVector::new(6.0, 90.0), Utc::now())
            .unwrap();
        assert!(session.is_dirty());
        let after = session.current_trajectory().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.total_drift() > before.total_drift());
        // the old trajectory is untouched
        assert!((before.total_drift() - 2400.0).abs() < 1e-6);
        assert_eq!(session.runs(), 2);
    }

    #[test]
    fn test_parameter_change_recomputes() {
        let mut session = ready_session();
        session.current_trajectory().unwrap();
        session.on_parameters_changed(params(2000.0)).unwrap();
        let trajectory = session.current_trajectory().unwrap();
        assert_eq!(trajectory.len(), 400);
    }

    #[test]
    fn test_invalid_parameters_keep_last_good() {
        let mut session = ready_session();
        let good = session.current_trajectory().unwrap();

        let result = session.on_parameters_changed(DescentParameters::new(
            0.0,
            100.0,
            DescentModel::Constant { rate: 5.0 },
            1.0,
        ));
        assert!(matches!(result, Err(SpotDriftError::InvalidRange { .. })));
        assert_eq!(session.parameters().unwrap().jump_altitude, 4000.0);

        let again = session.current_trajectory().unwrap();
        assert!(Arc::ptr_eq(&good, &again));
    }

    #[test]
    fn test_failed_run_keeps_last_good_and_stays_dirty() {
        let mut session = ready_session();
        let good = session.current_trajectory().unwrap();

        session
            .on_parameters_changed(DescentParameters::new(
                4000.0,
                0.0,
                DescentModel::Constant { rate: 0.0 },
                1.0,
            ))
            .unwrap();
        assert!(matches!(
            session.current_trajectory(),
            Err(SpotDriftError::InvalidDescentRate { .. })
        ));
        assert!(session.is_dirty());
        assert!(Arc::ptr_eq(&session.last_good_trajectory().unwrap(), &good));
    }

    #[test]
    fn test_observations_become_bands() {
        let mut session = TrajectorySession::new();
        let now = Utc::now();
        let observations = [
            WindObservation { altitude: 10.0, vector: WindVector::new(2.0, 0.0), observed_at: now },
            WindObservation { altitude: 1000.0, vector: WindVector::new(8.0, 0.0), observed_at: now },
        ];
        assert_eq!(session.on_wind_observations(&observations, 1.0).unwrap(), 2);
        let bands: Vec<_> = session
            .profile()
            .bands()
            .iter()
            .map(|e| (e.band.low(), e.band.high()))
            .collect();
        assert_eq!(bands, vec![(10.0, 11.0), (1000.0, 1001.0)]);
    }

    #[test]
    fn test_rejected_observation_discards_batch() {
        let mut session = ready_session();
        let cached = session.current_trajectory().unwrap();
        let before = session.profile().clone();
        let now = Utc::now();
        let observations = [
            WindObservation { altitude: 500.0, vector: WindVector::new(9.0, 180.0), observed_at: now },
            WindObservation { altitude: f64::NAN, vector: WindVector::new(3.0, 0.0), observed_at: now },
        ];

        let result = session.on_wind_observations(&observations, 1.0);
        assert!(matches!(result, Err(SpotDriftError::InvalidBand { .. })));
        assert_eq!(session.profile(), &before);
        assert!(!session.is_dirty());
        assert!(Arc::ptr_eq(&session.current_trajectory().unwrap(), &cached));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = ready_session();
        let mut b = TrajectorySession::new();
        b.on_wind_update(band(0.0, 5000.0), WindVector::calm(), Utc::now())
            .unwrap();
        b.on_parameters_changed(params(4000.0)).unwrap();
        assert!(a.current_trajectory().unwrap().total_drift() > 0.0);
        assert_eq!(b.current_trajectory().unwrap().total_drift(), 0.0);
    }

    #[test]
    fn test_handle_shared_across_threads() {
        let handle = SessionHandle::new(TrajectorySession::new());
        handle.on_parameters_changed(params(1000.0)).unwrap();

        let feed = handle.clone();
        let writer = thread::spawn(move || {
            for i in 0..50 {
                let low = f64::from(i) * 100.0;
                feed.on_wind_update(band(low, low + 100.0), WindVector::new(1.0, 45.0), Utc::now())
                    .unwrap();
            }
        });
        for _ in 0..50 {
            match handle.current_trajectory() {
                Ok(trajectory) => assert_eq!(trajectory.landing().unwrap().altitude, 0.0),
                Err(SpotDriftError::NoData) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        writer.join().unwrap();

        let trajectory = handle.current_trajectory().unwrap();
        assert_eq!(trajectory.len(), 200);
        assert_eq!(handle.inspect(|s| s.profile().len()), 50);
    }
}
