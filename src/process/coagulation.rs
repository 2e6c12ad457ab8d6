//! Transition-regime coagulation with majorant rejection sampling.
//!
//! The pairwise kernel is bounded by two closed-form majorants, one per
//! regime. Each majorant expands bilinearly into terms that are sums over the
//! ensemble, so the total majorant rate is O(1) from the ensemble's cached
//! property sums and each term tells `perform` how to draw its pair. The
//! regime with the smaller total is the one offered to the event loop; the
//! true kernel then decides by acceptance whether a drawn pair coagulates.

use std::io::{Read, Write};

use log::{debug, warn};

use crate::cell::Cell;
use crate::constants::{
    PhysicalConstants, DEFAULT_ENHANCEMENT_FM, DISTINCT_SELECTION_RETRIES, FREE_MOL_MAJORANT_FACTOR,
};
use crate::ensemble::Ensemble;
use crate::error::Result;
use crate::gas::GasPhase;
use crate::mechanism::Mechanism;
use crate::particle::{Particle, PropertyCache, PropertyKey, Weighting};
use crate::process::record::{read_f64, read_u32, write_f64, write_header, write_u32, COAGULATION_TAG};
use crate::process::{age_particle, NoOpReason, PerformStatus, Process, SelectionFailure};
use crate::random::RandomSource;

pub const TERM_COUNT: usize = 6;
const SLIP_FLOW_TERMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoagulationParams {
    /// Free-molecular enhancement factor (van der Waals).
    pub enhancement_fm: f64,
    pub slip_flow_prefactor: f64,
    pub free_mol_prefactor: f64,
    pub free_mol_majorant_factor: f64,
    pub slip_coefficient: f64,
    /// λ = coefficient · T / P
    pub mean_free_path_coefficient: f64,
    /// Overall kernel multiplier.
    pub rate_scale: f64,
    pub max_selection_retries: u32,
}

impl CoagulationParams {
    pub fn from_constants(constants: &PhysicalConstants, enhancement_fm: f64) -> Self {
        Self {
            enhancement_fm,
            slip_flow_prefactor: constants.slip_flow_prefactor(),
            free_mol_prefactor: constants.free_mol_prefactor(),
            free_mol_majorant_factor: FREE_MOL_MAJORANT_FACTOR,
            slip_coefficient: constants.slip_coefficient,
            mean_free_path_coefficient: constants.mean_free_path_coefficient,
            rate_scale: 1.0,
            max_selection_retries: DISTINCT_SELECTION_RETRIES,
        }
    }

    pub fn with_rate_scale(mut self, rate_scale: f64) -> Self {
        self.rate_scale = rate_scale;
        self
    }
}

impl Default for CoagulationParams {
    fn default() -> Self {
        Self::from_constants(&PhysicalConstants::default(), DEFAULT_ENHANCEMENT_FM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorantType {
    SlipFlow,
    FreeMol,
}

/// One term of the majorant expansion; the position in [`CoagulationTerm::ALL`]
/// is the term index seen by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoagulationTerm {
    SlipFlow1,
    SlipFlow2,
    SlipFlow3,
    SlipFlow4,
    FreeMol1,
    FreeMol2,
}

impl CoagulationTerm {
    pub const ALL: [CoagulationTerm; TERM_COUNT] = [
        CoagulationTerm::SlipFlow1,
        CoagulationTerm::SlipFlow2,
        CoagulationTerm::SlipFlow3,
        CoagulationTerm::SlipFlow4,
        CoagulationTerm::FreeMol1,
        CoagulationTerm::FreeMol2,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn majorant(self) -> MajorantType {
        match self {
            CoagulationTerm::SlipFlow1
            | CoagulationTerm::SlipFlow2
            | CoagulationTerm::SlipFlow3
            | CoagulationTerm::SlipFlow4 => MajorantType::SlipFlow,
            CoagulationTerm::FreeMol1 | CoagulationTerm::FreeMol2 => MajorantType::FreeMol,
        }
    }

    pub fn first_weighting(self) -> Weighting {
        match self {
            CoagulationTerm::SlipFlow1 | CoagulationTerm::SlipFlow3 | CoagulationTerm::FreeMol1 => Weighting::Uniform,
            CoagulationTerm::SlipFlow2 | CoagulationTerm::SlipFlow4 => Weighting::By(PropertyKey::CollisionDiameter),
            CoagulationTerm::FreeMol2 => Weighting::By(PropertyKey::DiameterSquared),
        }
    }

    pub fn second_weighting(self) -> Weighting {
        match self {
            CoagulationTerm::SlipFlow1 => Weighting::Uniform,
            CoagulationTerm::SlipFlow2 | CoagulationTerm::SlipFlow3 => Weighting::By(PropertyKey::InverseDiameter),
            CoagulationTerm::SlipFlow4 => Weighting::By(PropertyKey::InverseDiameterSquared),
            CoagulationTerm::FreeMol1 => Weighting::By(PropertyKey::DiameterSquaredInverseSqrtMass),
            CoagulationTerm::FreeMol2 => Weighting::By(PropertyKey::InverseSqrtMass),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitionCoagulation {
    params: CoagulationParams,
}

impl TransitionCoagulation {
    pub const NAME: &'static str = "transition_coagulation";

    pub fn new(params: CoagulationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CoagulationParams {
        &self.params
    }

    pub fn mean_free_path(&self, gas: &GasPhase) -> f64 {
        self.params.mean_free_path_coefficient * gas.temperature() / gas.pressure()
    }

    /// All six majorant terms before regime selection.
    pub fn majorant_terms(&self, n: f64, sums: &PropertyCache, gas: &GasPhase, volume: f64) -> [f64; TERM_COUNT] {
        let p = &self.params;
        let t = gas.temperature();
        let a = p.slip_flow_prefactor * (t / gas.viscosity()) * p.rate_scale;
        let b = 2.0 * p.slip_coefficient * self.mean_free_path(gas) * a;
        let c = p.free_mol_majorant_factor * p.enhancement_fm * p.free_mol_prefactor * t.sqrt() * p.rate_scale;

        let d = sums.property(PropertyKey::CollisionDiameter);
        let d2 = sums.property(PropertyKey::DiameterSquared);
        let d_1 = sums.property(PropertyKey::InverseDiameter);
        let d_2 = sums.property(PropertyKey::InverseDiameterSquared);
        let m_1_2 = sums.property(PropertyKey::InverseSqrtMass);
        let d2m_1_2 = sums.property(PropertyKey::DiameterSquaredInverseSqrtMass);

        let terms = [
            n * (n - 1.0) * a / volume,
            (d * d_1 - n) * a / volume,
            (n - 1.0) * d_1 * b / volume,
            (d * d_2 - d_1) * b / volume,
            (n - 1.0) * d2m_1_2 * c / volume,
            (m_1_2 * d2 - d2m_1_2) * c / volume,
        ];
        // Each term is non-negative in exact arithmetic; rounding must not
        // push one below zero.
        terms.map(|term| term.max(0.0))
    }

    /// Terms offered to the event loop: the smaller regime, the other zeroed.
    fn cell_terms(&self, cell: &Cell) -> [f64; TERM_COUNT] {
        let n = cell.particle_count();
        if n < 2 {
            return [0.0; TERM_COUNT];
        }
        let mut terms = self.majorant_terms(n as f64, cell.particles().sums(), cell.gas(), cell.sample_volume());
        let slip_flow: f64 = terms[..SLIP_FLOW_TERMS].iter().sum();
        let free_mol: f64 = terms[SLIP_FLOW_TERMS..].iter().sum();

        if !slip_flow.is_finite() || !free_mol.is_finite() || (slip_flow <= 0.0 && free_mol <= 0.0) {
            return [0.0; TERM_COUNT];
        }
        if slip_flow > free_mol {
            terms[..SLIP_FLOW_TERMS].fill(0.0);
        } else {
            terms[SLIP_FLOW_TERMS..].fill(0.0);
        }
        terms
    }

    /// Free-molecular kernel (m³/s), either the true value or its majorant.
    pub fn free_mol_kernel(&self, p1: &Particle, p2: &Particle, temperature_k: f64, majorant: bool) -> f64 {
        let p = &self.params;
        let d1 = p1.collision_diameter();
        let d2 = p2.collision_diameter();
        if majorant {
            p.free_mol_majorant_factor
                * p.enhancement_fm
                * p.free_mol_prefactor
                * p.rate_scale
                * temperature_k.sqrt()
                * (p1.property(PropertyKey::InverseSqrtMass) + p2.property(PropertyKey::InverseSqrtMass))
                * (d1 * d1 + d2 * d2)
        } else {
            let reduced = 1.0 / p1.mass() + 1.0 / p2.mass();
            p.enhancement_fm
                * p.free_mol_prefactor
                * p.rate_scale
                * (temperature_k * reduced).sqrt()
                * (d1 + d2)
                * (d1 + d2)
        }
    }

    /// Slip-flow kernel (m³/s); also its own majorant.
    pub fn slip_flow_kernel(&self, p1: &Particle, p2: &Particle, gas: &GasPhase) -> f64 {
        let p = &self.params;
        let d1 = p1.collision_diameter();
        let d2 = p2.collision_diameter();
        let inv = p1.property(PropertyKey::InverseDiameter) + p2.property(PropertyKey::InverseDiameter);
        let inv_sq =
            p1.property(PropertyKey::InverseDiameterSquared) + p2.property(PropertyKey::InverseDiameterSquared);
        let slip = 2.0 * p.slip_coefficient * self.mean_free_path(gas) * inv_sq;
        p.slip_flow_prefactor * p.rate_scale * (gas.temperature() / gas.viscosity()) * (d1 + d2) * (slip + inv)
    }

    pub fn majorant_kernel(&self, p1: &Particle, p2: &Particle, gas: &GasPhase, majorant: MajorantType) -> f64 {
        match majorant {
            MajorantType::SlipFlow => self.slip_flow_kernel(p1, p2, gas),
            MajorantType::FreeMol => self.free_mol_kernel(p1, p2, gas.temperature(), true),
        }
    }

    /// Transition-regime kernel: harmonic combination of the two regimes.
    pub fn true_kernel(&self, p1: &Particle, p2: &Particle, gas: &GasPhase) -> f64 {
        let fm = self.free_mol_kernel(p1, p2, gas.temperature(), false);
        let sf = self.slip_flow_kernel(p1, p2, gas);
        if fm + sf > 0.0 { fm * sf / (fm + sf) } else { 0.0 }
    }

    fn select_second(
        &self,
        ensemble: &Ensemble,
        first: usize,
        weighting: Weighting,
        rng: &mut RandomSource,
    ) -> Option<usize> {
        for _ in 0..self.params.max_selection_retries {
            match ensemble.select(weighting, rng) {
                Some(index) if index != first => return Some(index),
                Some(_) => continue,
                None => return None,
            }
        }
        None
    }

    pub(crate) fn read_fields(input: &mut dyn Read) -> Result<Self> {
        let params = CoagulationParams {
            enhancement_fm: read_f64(input)?,
            slip_flow_prefactor: read_f64(input)?,
            free_mol_prefactor: read_f64(input)?,
            free_mol_majorant_factor: read_f64(input)?,
            slip_coefficient: read_f64(input)?,
            mean_free_path_coefficient: read_f64(input)?,
            rate_scale: read_f64(input)?,
            max_selection_retries: read_u32(input)?,
        };
        Ok(Self::new(params))
    }
}

impl Process for TransitionCoagulation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn term_count(&self) -> usize {
        TERM_COUNT
    }

    fn rate(&self, _time: f64, cell: &Cell) -> f64 {
        self.cell_terms(cell).iter().sum()
    }

    fn rate_terms(&self, _time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64 {
        let cell_terms = self.cell_terms(cell);
        terms.extend_from_slice(&cell_terms);
        cell_terms.iter().sum()
    }

    fn perform(
        &self,
        time: f64,
        cell: &mut Cell,
        term: usize,
        mechanism: &Mechanism,
        rng: &mut RandomSource,
    ) -> PerformStatus {
        if cell.particle_count() < 2 {
            return PerformStatus::Failed(SelectionFailure::TooFewParticles);
        }
        let term = CoagulationTerm::from_index(term).unwrap_or(CoagulationTerm::SlipFlow1);

        let (ip1, ip2, majorant) = {
            let (gas, ensemble) = cell.parts_mut();
            let Some(ip1) = ensemble.select(term.first_weighting(), rng) else {
                debug!("coagulation {:?}: no first particle", term);
                return PerformStatus::Failed(SelectionFailure::NoFirstParticle);
            };
            let Some(ip2) = self.select_second(ensemble, ip1, term.second_weighting(), rng) else {
                debug!("coagulation {:?}: no distinct second particle for {}", term, ip1);
                return PerformStatus::Failed(SelectionFailure::NoDistinctSecond);
            };
            let (Some(p1), Some(p2)) = (ensemble.at(ip1), ensemble.at(ip2)) else {
                return PerformStatus::Failed(SelectionFailure::NoFirstParticle);
            };
            // Evaluated on the pair as drawn, before aging.
            (ip1, ip2, self.majorant_kernel(p1, p2, gas, term.majorant()))
        };

        if !age_particle(cell, ip1, time, mechanism, rng) {
            cell.particles_mut().remove(ip1);
            return PerformStatus::NoOp(NoOpReason::ParticleInvalidated);
        }
        if !age_particle(cell, ip2, time, mechanism, rng) {
            // ip1 goes into the tree before the swap-remove can move it.
            let ensemble = cell.particles_mut();
            ensemble.update(ip1);
            ensemble.remove(ip2);
            return PerformStatus::NoOp(NoOpReason::ParticleInvalidated);
        }

        let (gas, ensemble) = cell.parts_mut();
        let true_kernel = match (ensemble.at(ip1), ensemble.at(ip2)) {
            (Some(p1), Some(p2)) => {
                let kernel = self.true_kernel(p1, p2, gas);
                if majorant < kernel {
                    warn!(
                        "coagulation {:?}: majorant {:e} below true kernel {:e}",
                        term.majorant(),
                        majorant,
                        kernel
                    );
                }
                kernel * mechanism.model().collision_efficiency().efficiency(p1, p2)
            }
            _ => 0.0,
        };

        let deviate = rng.uniform();
        if majorant > 0.0 && deviate < true_kernel / majorant {
            if let Some((p1, p2)) = ensemble.pair_mut(ip1, ip2) {
                p1.coagulate(p2, mechanism.model());
                p1.set_last_update_time(time);
            }
            ensemble.update(ip1);
            ensemble.remove(ip2);
            PerformStatus::Success
        } else {
            ensemble.update(ip1);
            ensemble.update(ip2);
            PerformStatus::NoOp(NoOpReason::Fictitious)
        }
    }

    fn write_record(&self, out: &mut dyn Write) -> Result<()> {
        let p = &self.params;
        write_header(out, COAGULATION_TAG)?;
        write_f64(out, p.enhancement_fm)?;
        write_f64(out, p.slip_flow_prefactor)?;
        write_f64(out, p.free_mol_prefactor)?;
        write_f64(out, p.free_mol_majorant_factor)?;
        write_f64(out, p.slip_coefficient)?;
        write_f64(out, p.mean_free_path_coefficient)?;
        write_f64(out, p.rate_scale)?;
        write_u32(out, p.max_selection_retries)
    }
}
