//! Descent-rate models
//!
//! A descent model maps altitude to vertical speed (m/s, positive down).
//! Rates are not checked here; the integrator rejects a non-positive rate
//! at the altitude where it first shows up.

use crate::models::DescentPhase;
use crate::{Result, SpotDriftError};
use std::fmt;
use std::sync::Arc;

/// Sea level standard pressure, Pa
const SEA_LEVEL_PRESSURE: f64 = 101_325.0;
/// Temperature lapse rate, K/m
const LAPSE_RATE: f64 = 0.0065;
/// Sea level standard temperature, K
const SEA_LEVEL_TEMPERATURE: f64 = 288.15;
/// m/s²
const GRAVITY: f64 = 9.806_65;
/// Molar mass of dry air, kg/mol
const MOLAR_MASS_AIR: f64 = 0.028_964_4;
/// Universal gas constant, J/(mol·K)
const GAS_CONSTANT: f64 = 8.314_459_8;
/// Specific gas constant of dry air, J/(kg·K)
const GAS_CONSTANT_AIR: f64 = 287.058;
/// Vertical speed at exit, m/s. Kept above zero so the first step descends.
pub const EXIT_SPEED: f64 = 1.0;

/// Standard-atmosphere pressure in Pa at `altitude` metres
#[must_use]
pub fn air_pressure(altitude: f64) -> f64 {
    let exponent = GRAVITY * MOLAR_MASS_AIR / (GAS_CONSTANT * LAPSE_RATE);
    SEA_LEVEL_PRESSURE * (1.0 - LAPSE_RATE * altitude / SEA_LEVEL_TEMPERATURE).powf(exponent)
}

/// Standard-atmosphere air density in kg/m³ at `altitude` metres
#[must_use]
pub fn air_density(altitude: f64) -> f64 {
    let temperature = SEA_LEVEL_TEMPERATURE - LAPSE_RATE * altitude;
    air_pressure(altitude) / (GAS_CONSTANT_AIR * temperature)
}

/// Altitude → rate lookup table, linearly interpolated and clamped at the ends
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    /// (altitude, rate) sorted by altitude
    rows: Vec<(f64, f64)>,
}

impl RateTable {
    pub fn new(mut rows: Vec<(f64, f64)>) -> Result<Self> {
        if rows.is_empty() {
            return Err(SpotDriftError::validation("descent rate table is empty"));
        }
        if let Some((altitude, rate)) = rows
            .iter()
            .find(|(altitude, rate)| !altitude.is_finite() || !rate.is_finite())
        {
            return Err(SpotDriftError::validation(format!(
                "descent rate table row ({altitude}, {rate}) is not finite"
            )));
        }
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rate_at(&self, altitude: f64) -> f64 {
        let upper = self.rows.partition_point(|&(a, _)| a <= altitude);
        match (upper.checked_sub(1).map(|i| self.rows[i]), self.rows.get(upper)) {
            (None, Some(&(_, rate))) => rate,
            (Some((_, rate)), None) => rate,
            (Some((a0, r0)), Some(&(a1, r1))) => r0 + (r1 - r0) * (altitude - a0) / (a1 - a0),
            (None, None) => f64::NAN,
        }
    }
}

/// Freefall accelerating from exit against drag down to the deploy
/// altitude, then a non-gliding canopy at constant vertical speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreefallCanopy {
    pub mass_kg: f64,
    /// Drag coefficient times reference area, m²
    pub drag_area_m2: f64,
    pub deploy_altitude: f64,
    /// Vertical speed under canopy, m/s
    pub canopy_rate: f64,
}

impl FreefallCanopy {
    /// Terminal velocity at `altitude`
    #[must_use]
    pub fn terminal_velocity(&self, altitude: f64) -> f64 {
        (2.0 * self.mass_kg * GRAVITY / (air_density(altitude) * self.drag_area_m2)).sqrt()
    }

    /// Freefall speed at `altitude` after leaving the aircraft at `exit_altitude`.
    ///
    /// Solves `v dv/ds = g - k v²` over the distance fallen `s`, with the drag
    /// factor `k = rho CdA / 2m` taken at `altitude`: the squared speed
    /// relaxes from `EXIT_SPEED²` towards the terminal velocity squared.
    #[must_use]
    pub fn freefall_speed(&self, exit_altitude: f64, altitude: f64) -> f64 {
        let fallen = (exit_altitude - altitude).max(0.0);
        let drag = air_density(altitude) * self.drag_area_m2 / (2.0 * self.mass_kg);
        let decay = (-2.0 * drag * fallen).exp();
        let terminal = self.terminal_velocity(altitude);
        (terminal.powi(2) * (1.0 - decay) + EXIT_SPEED.powi(2) * decay).sqrt()
    }
}

/// Descent-rate function of the skydiver
#[derive(Clone)]
pub enum DescentModel {
    Constant { rate: f64 },
    Table(RateTable),
    FreefallCanopy(FreefallCanopy),
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl DescentModel {
    /// Vertical speed in m/s at `altitude` on a descent that started at `exit_altitude`
    #[must_use]
    pub fn rate_at(&self, exit_altitude: f64, altitude: f64) -> f64 {
        match self {
            DescentModel::Constant { rate } => *rate,
            DescentModel::Table(table) => table.rate_at(altitude),
            DescentModel::FreefallCanopy(model) => {
                if altitude > model.deploy_altitude {
                    model.freefall_speed(exit_altitude, altitude)
                } else {
                    model.canopy_rate
                }
            }
            DescentModel::Custom(rate) => rate(altitude),
        }
    }

    /// Phase at `altitude`, for models that distinguish freefall and canopy
    #[must_use]
    pub fn phase_at(&self, altitude: f64) -> Option<DescentPhase> {
        match self {
            DescentModel::FreefallCanopy(model) if altitude > model.deploy_altitude => {
                Some(DescentPhase::Freefall)
            }
            DescentModel::FreefallCanopy(_) => Some(DescentPhase::Canopy),
            _ => None,
        }
    }
}

impl fmt::Debug for DescentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescentModel::Constant { rate } => f.debug_struct("Constant").field("rate", rate).finish(),
            DescentModel::Table(table) => f.debug_tuple("Table").field(table).finish(),
            DescentModel::FreefallCanopy(model) => {
                f.debug_tuple("FreefallCanopy").field(model).finish()
            }
            DescentModel::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Everything the integrator needs to know about the jump
#[derive(Debug, Clone)]
pub struct DescentParameters {
    /// Exit altitude, metres
    pub jump_altitude: f64,
    /// Ground altitude at the landing area, metres
    pub landing_altitude: f64,
    pub descent: DescentModel,
    /// Integration time step, seconds
    pub sample_interval: f64,
}

impl DescentParameters {
    #[must_use]
    pub fn new(
        jump_altitude: f64,
        landing_altitude: f64,
        descent: DescentModel,
        sample_interval: f64,
    ) -> Self {
        Self {
            jump_altitude,
            landing_altitude,
            descent,
            sample_interval,
        }
    }

    /// Vertical speed in m/s at `altitude` on this jump
    #[must_use]
    pub fn rate_at(&self, altitude: f64) -> f64 {
        self.descent.rate_at(self.jump_altitude, altitude)
    }

    /// Check the altitude range and time step
    pub fn validate(&self) -> Result<()> {
        // negated so NaN fails too
        if !(self.jump_altitude > self.landing_altitude) {
            return Err(SpotDriftError::InvalidRange {
                jump: self.jump_altitude,
                landing: self.landing_altitude,
            });
        }
        if !(self.sample_interval > 0.0) || !self.sample_interval.is_finite() {
            return Err(SpotDriftError::InvalidSampleInterval {
                interval: self.sample_interval,
            });
        }
        Ok(())
    }
}
