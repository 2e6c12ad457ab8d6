//! The particle mechanism: physical constants, gas species, particle model and
//! the list of processes acting on a cell.

use log::debug;

use crate::cell::Cell;
use crate::constants::PhysicalConstants;
use crate::gas::{GasPhase, SpeciesTable};
use crate::particle::{Particle, ParticleModel};
use crate::process::{ParticleProcess, PerformStatus, Process, SelectionFailure};
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq)]
pub struct Mechanism {
    constants: PhysicalConstants,
    species: SpeciesTable,
    model: ParticleModel,
    processes: Vec<ParticleProcess>,
}

impl Mechanism {
    pub fn new(constants: PhysicalConstants, species: SpeciesTable, model: ParticleModel) -> Self {
        Self {
            constants,
            species,
            model,
            processes: Vec::new(),
        }
    }

    pub fn with_process(mut self, process: impl Into<ParticleProcess>) -> Self {
        self.add_process(process);
        self
    }

    pub fn add_process(&mut self, process: impl Into<ParticleProcess>) {
        let process = process.into();
        debug!(
            "mechanism: added {} ({} terms{})",
            process.name(),
            process.term_count(),
            if process.is_deferred() { ", deferred" } else { "" }
        );
        self.processes.push(process);
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    pub fn model(&self) -> &ParticleModel {
        &self.model
    }

    pub fn processes(&self) -> &[ParticleProcess] {
        &self.processes
    }

    /// Processes that compete in the event loop.
    pub fn event_processes(&self) -> impl Iterator<Item = &ParticleProcess> {
        self.processes.iter().filter(|p| !p.is_deferred())
    }

    pub fn term_count(&self) -> usize {
        self.event_processes().map(Process::term_count).sum()
    }

    /// Rate terms of every event process, in order; returns the total.
    pub fn rate_terms(&self, time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64 {
        self.event_processes()
            .map(|process| process.rate_terms(time, cell, terms))
            .sum()
    }

    /// Performs the event for a term index into [`Mechanism::rate_terms`].
    pub fn perform(&self, time: f64, cell: &mut Cell, term: usize, rng: &mut RandomSource) -> PerformStatus {
        let mut offset = 0;
        for process in self.event_processes() {
            let count = process.term_count();
            if term < offset + count {
                return process.perform(time, cell, term - offset, self, rng);
            }
            offset += count;
        }
        debug!("mechanism: term {} out of range ({} terms)", term, offset);
        PerformStatus::Failed(SelectionFailure::NoFirstParticle)
    }

    /// Brings one particle up to `time` by applying a Poisson-distributed number
    /// of events from each deferred process.
    ///
    /// Stops early once the particle becomes invalid; the caller removes it.
    pub fn update_particle(&self, particle: &mut Particle, gas: &GasPhase, time: f64, rng: &mut RandomSource) {
        let dt = time - particle.last_update_time();
        if dt > 0.0 {
            for law in self.processes.iter().filter_map(ParticleProcess::rate_law) {
                if !law.is_deferred() {
                    continue;
                }
                let rate = law.particle_rate(gas, particle, &self.model);
                let events = rng.poisson(rate * dt);
                if events > 0 {
                    particle.adjust(law.changes(), events as f64, &self.model);
                    if !particle.is_valid() {
                        break;
                    }
                }
            }
        }
        particle.set_last_update_time(time);
    }

    /// Ages every particle in the cell to `time`, removing those consumed.
    /// Returns how many were removed.
    pub fn update_all_particles(&self, cell: &mut Cell, time: f64, rng: &mut RandomSource) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < cell.particle_count() {
            let (gas, ensemble) = cell.parts_mut();
            let valid = match ensemble.at_mut(index) {
                Some(particle) => {
                    self.update_particle(particle, gas, time, rng);
                    particle.is_valid()
                }
                None => break,
            };
            if valid {
                ensemble.update(index);
                index += 1;
            } else {
                // The last particle moves into this slot and is visited next.
                ensemble.remove(index);
                removed += 1;
            }
        }
        removed
    }
}
