//! Manually entered wind tables
//!
//! One reading per line, `altitude_m,speed_ms,direction_deg`. Blank lines
//! and lines starting with `#` are ignored.

use super::WindSource;
use crate::models::{WindObservation, WindVector};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// How the direction column of a table is meant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionConvention {
    /// Bearing the wind blows towards
    #[default]
    Toward,
    /// Meteorological bearing the wind comes from
    From,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct WindRow {
    altitude_m: f64,
    speed_ms: f64,
    direction_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableWindSource {
    rows: Vec<WindRow>,
    convention: DirectionConvention,
}

impl TableWindSource {
    pub fn from_path(path: impl AsRef<Path>, convention: DirectionConvention) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open wind table: {}", path.display()))?;
        let source = Self::from_reader(file, convention)
            .with_context(|| format!("Failed to read wind table: {}", path.display()))?;
        info!("Loaded {} wind rows from {:?}", source.rows.len(), path);
        Ok(source)
    }

    pub fn from_reader<R: Read>(reader: R, convention: DirectionConvention) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<WindRow>().enumerate() {
            let row = record.with_context(|| format!("Invalid wind row {}", line + 1))?;
            rows.push(row);
        }
        if rows.is_empty() {
            anyhow::bail!("Wind table has no rows");
        }
        Ok(Self { rows, convention })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl WindSource for TableWindSource {
    fn name(&self) -> &str {
        "table"
    }

    async fn fetch(&self) -> Result<Vec<WindObservation>> {
        let observed_at = Utc::now();
        let mut observations: Vec<WindObservation> = self
            .rows
            .iter()
            .map(|row| WindObservation {
                altitude: row.altitude_m,
                vector: match self.convention {
                    DirectionConvention::Toward => WindVector::new(row.speed_ms, row.direction_deg),
                    DirectionConvention::From => {
                        WindVector::from_meteorological(row.speed_ms, row.direction_deg)
                    }
                },
                observed_at,
            })
            .collect();
        observations.sort_by(|a, b| a.altitude.total_cmp(&b.altitude));
        Ok(observations)
    }
}
