//! Layered wind profile
//!
//! Stores the best-known wind per altitude band and answers point queries.
//! Bands never overlap: a new band clips or splits whatever it covers.
//! Queries inside a band return its vector, queries in a gap interpolate
//! between the neighbouring bands, queries outside all bands clamp to the
//! nearest one.

use crate::models::{AltitudeBand, BandEntry, WindVector};
use crate::{Result, SpotDriftError};
use chrono::{DateTime, Utc};
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindProfile {
    /// Sorted by `band.low`, pairwise disjoint
    entries: Vec<BandEntry>,
    last_updated: Option<DateTime<Utc>>,
}

impl WindProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the wind for `band`, clipping overlapped bands
    pub fn update(
        &mut self,
        band: AltitudeBand,
        vector: WindVector,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        if !vector.is_finite() {
            return Err(SpotDriftError::validation(format!(
                "wind vector for band [{}, {}) is not finite",
                band.low(),
                band.high()
            )));
        }

        let mut entries = Vec::with_capacity(self.entries.len() + 2);
        for entry in &self.entries {
            if !entry.band.overlaps(&band) {
                entries.push(*entry);
                continue;
            }
            if entry.band.low() < band.low() {
                entries.push(BandEntry {
                    band: AltitudeBand::new(entry.band.low(), band.low())?,
                    ..*entry
                });
            }
            if entry.band.high() > band.high() {
                entries.push(BandEntry {
                    band: AltitudeBand::new(band.high(), entry.band.high())?,
                    ..*entry
                });
            }
        }
        entries.push(BandEntry {
            band,
            vector,
            updated_at: timestamp,
        });
        entries.sort_by(|a, b| a.band.low().total_cmp(&b.band.low()));
        self.entries = entries;

        self.last_updated = Some(match self.last_updated {
            Some(previous) if previous > timestamp => previous,
            _ => timestamp,
        });
        trace!(
            low = band.low(),
            high = band.high(),
            bands = self.entries.len(),
            "wind band updated"
        );
        Ok(())
    }

    /// Wind at `altitude`
    pub fn lookup(&self, altitude: f64) -> Result<WindVector> {
        let (first, last) = match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SpotDriftError::NoData),
        };

        let above_index = self.entries.partition_point(|e| e.band.low() <= altitude);
        if above_index == 0 {
            return Ok(first.vector);
        }

        let below = &self.entries[above_index - 1];
        if below.band.contains(altitude) {
            return Ok(below.vector);
        }

        match self.entries.get(above_index) {
            None => Ok(last.vector),
            Some(above) => {
                let gap = above.band.low() - below.band.high();
                let fraction = (altitude - below.band.high()) / gap;
                Ok(below.vector.interpolate(&above.vector, fraction))
            }
        }
    }

    /// Recorded bands, lowest first
    #[must_use]
    pub fn bands(&self) -> &[BandEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest timestamp seen by `update`
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
