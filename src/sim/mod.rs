pub mod parallel;

pub use parallel::run_cells_parallel;

use std::time::Instant;

use log::{info, trace};

use crate::cell::Cell;
use crate::mechanism::Mechanism;
use crate::process::{NoOpReason, PerformStatus};
use crate::random::RandomSource;

/// Event tallies from one solver run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverStats {
    pub events: u64,
    pub successes: u64,
    pub fictitious: u64,
    pub invalidated: u64,
    pub failed: u64,
    /// Particles removed by the final aging pass.
    pub removed_at_end: usize,
    pub final_time: f64,
}

impl SolverStats {
    fn record(&mut self, status: PerformStatus) {
        self.events += 1;
        match status {
            PerformStatus::Success => self.successes += 1,
            PerformStatus::NoOp(NoOpReason::Fictitious) => self.fictitious += 1,
            PerformStatus::NoOp(NoOpReason::ParticleInvalidated) => self.invalidated += 1,
            PerformStatus::Failed(_) => self.failed += 1,
        }
    }

    /// Share of events rejected by the majorant test.
    pub fn fictitious_fraction(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.fictitious as f64 / self.events as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverProps {
    /// Stop after this many events even if `t_stop` is not reached.
    pub max_events: Option<u64>,
}

/// Direct-simulation event loop for one cell.
pub struct StochasticSolver<'a> {
    mechanism: &'a Mechanism,
    max_events: Option<u64>,
}

impl<'a> StochasticSolver<'a> {
    pub fn new(mechanism: &'a Mechanism, props: SolverProps) -> StochasticSolver<'a> {
        StochasticSolver {
            mechanism,
            max_events: props.max_events,
        }
    }

    pub fn mechanism(&self) -> &Mechanism {
        self.mechanism
    }

    /// Advances `cell` from `t_start` towards `t_stop`.
    ///
    /// Waiting times are exponential in the total rate of the event
    /// processes; the term that fires is chosen by cumulative sum. When the
    /// loop ends every particle is aged to the stop time and consumed
    /// particles are removed.
    pub fn run(&self, cell: &mut Cell, t_start: f64, t_stop: f64, rng: &mut RandomSource) -> SolverStats {
        let started = Instant::now();
        let mut stats = SolverStats::default();
        let mut terms = Vec::with_capacity(self.mechanism.term_count());
        let mut time = t_start;
        let mut stopped_early = false;

        loop {
            if self.max_events.is_some_and(|max| stats.events >= max) {
                stopped_early = true;
                break;
            }
            terms.clear();
            let total = self.mechanism.rate_terms(time, cell, &mut terms);
            let Some(wait) = rng.exponential(total) else {
                trace!("t={:e}: total rate {:e}, nothing left to do", time, total);
                break;
            };
            if time + wait > t_stop {
                break;
            }
            time += wait;

            let Some(term) = choose_term(&terms, total, rng) else {
                break;
            };
            let status = self.mechanism.perform(time, cell, term, rng);
            trace!("t={:e} term={} -> {:?} (n={})", time, term, status, cell.particle_count());
            stats.record(status);
        }

        stats.final_time = if stopped_early { time } else { t_stop };
        stats.removed_at_end = self.mechanism.update_all_particles(cell, stats.final_time, rng);

        info!(
            "solver: {} events ({} merged/applied, {} fictitious, {} invalidated, {} failed), {} particles left at t={:e} in {:.2?}",
            stats.events,
            stats.successes,
            stats.fictitious,
            stats.invalidated,
            stats.failed,
            cell.particle_count(),
            stats.final_time,
            started.elapsed()
        );
        stats
    }
}

/// Index of the term a uniform draw lands in.
fn choose_term(terms: &[f64], total: f64, rng: &mut RandomSource) -> Option<usize> {
    let target = rng.uniform() * total;
    let mut cumulative = 0.0;
    for (index, &rate) in terms.iter().enumerate() {
        cumulative += rate;
        if target < cumulative {
            return Some(index);
        }
    }
    // Rounding can leave the target just past the last partial sum.
    terms.iter().rposition(|&rate| rate > 0.0)
}
