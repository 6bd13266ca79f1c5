//! Wind sources
//!
//! Producers of wind observations that push into a trajectory session.
//! A source only fetches; [`pump`] and [`run`] move what it fetched into a
//! [`SessionHandle`] so the session stays the single point of mutation.

use crate::models::WindObservation;
use crate::session::SessionHandle;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

pub mod open_meteo;
pub mod table;

pub use open_meteo::OpenMeteoWindSource;
pub use table::{DirectionConvention, TableWindSource};

#[async_trait]
pub trait WindSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Current wind observations, lowest altitude first
    async fn fetch(&self) -> Result<Vec<WindObservation>>;
}

/// Fetch once from `source` and record the observations in `session`
pub async fn pump(
    source: &dyn WindSource,
    session: &SessionHandle,
    band_thickness: f64,
) -> Result<usize> {
    let observations = source.fetch().await?;
    let recorded = session.on_wind_observations(&observations, band_thickness)?;
    info!(source = source.name(), recorded, "wind profile refreshed");
    Ok(recorded)
}

/// Keep refreshing `session` from `source` every `every`.
///
/// `on_refresh` runs right after each successful refresh with the number of
/// observations recorded; an error from it ends the loop. Failed fetches are
/// logged and retried on the next tick while the session keeps its previous
/// wind data.
pub async fn run<F>(
    source: &dyn WindSource,
    session: SessionHandle,
    band_thickness: f64,
    every: Duration,
    mut on_refresh: F,
) -> Result<()>
where
    F: FnMut(usize) -> Result<()>,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match pump(source, &session, band_thickness).await {
            Ok(recorded) => on_refresh(recorded)?,
            Err(e) => warn!(source = source.name(), "wind refresh failed: {e:#}"),
        }
    }
}
