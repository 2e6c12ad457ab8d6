//! Stochastic particle processes.
//!
//! Every process exposes a fixed number of rate terms whose sum is its total
//! rate, and a `perform` that executes one event of a chosen term against a
//! [`Cell`]. The concrete processes form the closed [`ParticleProcess`] enum;
//! the outer loop only talks to the [`Process`] trait.

pub mod coagulation;
pub mod mass_diffusion;
pub mod record;
pub mod schedule;
pub mod surface_oxidation;

pub use coagulation::{CoagulationParams, CoagulationTerm, MajorantType, TransitionCoagulation};
pub use mass_diffusion::{MassDiffusion, MassDiffusionParams};
pub use schedule::{TemperatureBand, TemperatureSchedule};
pub use surface_oxidation::{SurfaceOxidation, SurfaceOxidationParams};

use std::io::{Read, Write};

use thiserror::Error;

use crate::cell::Cell;
use crate::error::{Result, SweepError};
use crate::gas::GasPhase;
use crate::mechanism::Mechanism;
use crate::particle::{ComponentChange, Particle, ParticleModel};
use crate::random::RandomSource;

/// Why an accepted event left the cell unchanged apart from aging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoOpReason {
    /// Rejected by the majorant acceptance test.
    Fictitious,
    /// A selected particle was consumed while being brought up to date.
    ParticleInvalidated,
}

/// Selection failures; the event did not happen and the cell is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SelectionFailure {
    #[error("fewer than two particles in the ensemble")]
    TooFewParticles,
    #[error("no particle could be selected")]
    NoFirstParticle,
    #[error("no distinct second particle within the retry bound")]
    NoDistinctSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformStatus {
    Success,
    NoOp(NoOpReason),
    Failed(SelectionFailure),
}

pub trait Process {
    fn name(&self) -> &str;

    fn term_count(&self) -> usize;

    /// Total rate; always the sum of [`Process::rate_terms`].
    fn rate(&self, time: f64, cell: &Cell) -> f64 {
        let mut terms = Vec::with_capacity(self.term_count());
        self.rate_terms(time, cell, &mut terms)
    }

    /// Appends exactly `term_count()` non-negative terms and returns their sum.
    fn rate_terms(&self, time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64;

    fn perform(
        &self,
        time: f64,
        cell: &mut Cell,
        term: usize,
        mechanism: &Mechanism,
        rng: &mut RandomSource,
    ) -> PerformStatus;

    fn write_record(&self, out: &mut dyn Write) -> Result<()>;
}

/// A process that acts on one particle at a time with a closed-form rate.
///
/// Such a process can run deferred: instead of competing in the event loop, its
/// events are applied in bulk whenever a particle is brought up to date.
pub trait ParticleRateLaw {
    /// Event rate (s⁻¹) for one particle in the given gas.
    fn particle_rate(&self, gas: &GasPhase, particle: &Particle, model: &ParticleModel) -> f64;

    /// Composition change applied per event.
    fn changes(&self) -> &[ComponentChange];

    fn is_deferred(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleProcess {
    Coagulation(TransitionCoagulation),
    SurfaceOxidation(SurfaceOxidation),
    MassDiffusion(MassDiffusion),
}

impl ParticleProcess {
    fn as_process(&self) -> &dyn Process {
        match self {
            ParticleProcess::Coagulation(p) => p,
            ParticleProcess::SurfaceOxidation(p) => p,
            ParticleProcess::MassDiffusion(p) => p,
        }
    }

    /// The single-particle rate law, for processes that have one.
    pub fn rate_law(&self) -> Option<&dyn ParticleRateLaw> {
        match self {
            ParticleProcess::Coagulation(_) => None,
            ParticleProcess::SurfaceOxidation(p) => Some(p),
            ParticleProcess::MassDiffusion(p) => Some(p),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.rate_law().is_some_and(|law| law.is_deferred())
    }

    /// Restore any variant from a record written by [`Process::write_record`].
    pub fn read_record(input: &mut dyn Read) -> Result<Self> {
        match record::read_header(input)? {
            record::COAGULATION_TAG => Ok(ParticleProcess::Coagulation(TransitionCoagulation::read_fields(input)?)),
            record::SURFACE_OXIDATION_TAG => {
                Ok(ParticleProcess::SurfaceOxidation(SurfaceOxidation::read_fields(input)?))
            }
            record::MASS_DIFFUSION_TAG => Ok(ParticleProcess::MassDiffusion(MassDiffusion::read_fields(input)?)),
            other => Err(SweepError::Record(format!("unknown process tag {}", other))),
        }
    }
}

impl Process for ParticleProcess {
    fn name(&self) -> &str {
        self.as_process().name()
    }

    fn term_count(&self) -> usize {
        self.as_process().term_count()
    }

    fn rate(&self, time: f64, cell: &Cell) -> f64 {
        self.as_process().rate(time, cell)
    }

    fn rate_terms(&self, time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64 {
        self.as_process().rate_terms(time, cell, terms)
    }

    fn perform(
        &self,
        time: f64,
        cell: &mut Cell,
        term: usize,
        mechanism: &Mechanism,
        rng: &mut RandomSource,
    ) -> PerformStatus {
        self.as_process().perform(time, cell, term, mechanism, rng)
    }

    fn write_record(&self, out: &mut dyn Write) -> Result<()> {
        self.as_process().write_record(out)
    }
}

impl From<TransitionCoagulation> for ParticleProcess {
    fn from(process: TransitionCoagulation) -> Self {
        ParticleProcess::Coagulation(process)
    }
}

impl From<SurfaceOxidation> for ParticleProcess {
    fn from(process: SurfaceOxidation) -> Self {
        ParticleProcess::SurfaceOxidation(process)
    }
}

impl From<MassDiffusion> for ParticleProcess {
    fn from(process: MassDiffusion) -> Self {
        ParticleProcess::MassDiffusion(process)
    }
}

/// Brings the particle at `index` up to `time` and reports whether it is
/// still valid. The caller owes the ensemble an `update` or `remove`.
pub(crate) fn age_particle(
    cell: &mut Cell,
    index: usize,
    time: f64,
    mechanism: &Mechanism,
    rng: &mut RandomSource,
) -> bool {
    let (gas, ensemble) = cell.parts_mut();
    match ensemble.at_mut(index) {
        Some(particle) => {
            mechanism.update_particle(particle, gas, time, rng);
            particle.is_valid()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_unknown_tag_is_record_error() {
        let mut buf = Vec::new();
        record::write_header(&mut buf, 42).unwrap();
        let result = ParticleProcess::read_record(&mut Cursor::new(buf));
        assert!(matches!(result, Err(SweepError::Record(_))));
    }

    #[test]
    fn test_coagulation_is_never_deferred() {
        let process = ParticleProcess::from(TransitionCoagulation::default());
        assert!(!process.is_deferred());
        assert!(process.rate_law().is_none());
        assert_eq!(process.term_count(), 6);
    }
}
