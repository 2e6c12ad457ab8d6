use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::process::record::{read_f64, read_index, write_f64, write_index};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub below_k: f64,
    pub multiplier: f64,
}

/// Piecewise-constant rate multiplier in temperature.
///
/// The first band whose `below_k` exceeds the temperature applies; above every
/// band the `otherwise` multiplier applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSchedule")]
pub struct TemperatureSchedule {
    bands: Vec<TemperatureBand>,
    otherwise: f64,
}

#[derive(Deserialize)]
struct RawSchedule {
    #[serde(default)]
    bands: Vec<TemperatureBand>,
    otherwise: f64,
}

impl From<RawSchedule> for TemperatureSchedule {
    fn from(raw: RawSchedule) -> Self {
        Self::new(raw.bands, raw.otherwise)
    }
}

impl TemperatureSchedule {
    pub fn new(mut bands: Vec<TemperatureBand>, otherwise: f64) -> Self {
        bands.sort_by(|a, b| a.below_k.total_cmp(&b.below_k));
        Self { bands, otherwise }
    }

    pub fn constant(multiplier: f64) -> Self {
        Self {
            bands: Vec::new(),
            otherwise: multiplier,
        }
    }

    /// Aluminium oxidation: half rate below 2350 K, full rate up to the
    /// alumina boiling point, nothing above it.
    pub fn aluminum_oxidation() -> Self {
        Self::new(
            vec![
                TemperatureBand { below_k: 2350.0, multiplier: 0.5 },
                TemperatureBand { below_k: 2710.0, multiplier: 1.0 },
            ],
            0.0,
        )
    }

    /// Aluminium vapour diffusion: only above 2700 K.
    pub fn aluminum_diffusion() -> Self {
        Self::new(vec![TemperatureBand { below_k: 2700.0, multiplier: 0.0 }], 1.0)
    }

    pub fn bands(&self) -> &[TemperatureBand] {
        &self.bands
    }

    pub fn otherwise(&self) -> f64 {
        self.otherwise
    }

    pub fn multiplier(&self, temperature_k: f64) -> f64 {
        self.bands
            .iter()
            .find(|band| temperature_k < band.below_k)
            .map_or(self.otherwise, |band| band.multiplier)
    }

    pub(crate) fn write_fields(&self, out: &mut dyn Write) -> Result<()> {
        write_index(out, self.bands.len())?;
        for band in &self.bands {
            write_f64(out, band.below_k)?;
            write_f64(out, band.multiplier)?;
        }
        write_f64(out, self.otherwise)
    }

    pub(crate) fn read_fields(input: &mut dyn Read) -> Result<Self> {
        let count = read_index(input)?;
        let bands = (0..count)
            .map(|_| {
                Ok(TemperatureBand {
                    below_k: read_f64(input)?,
                    multiplier: read_f64(input)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let otherwise = read_f64(input)?;
        Ok(Self { bands, otherwise })
    }
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self::constant(1.0)
    }
}
