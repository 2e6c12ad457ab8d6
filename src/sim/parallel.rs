use rayon::prelude::*;

use crate::cell::Cell;
use crate::mechanism::Mechanism;
use crate::random::RandomSource;
use crate::sim::{SolverProps, SolverStats, StochasticSolver};

/// Advances independent cells concurrently; cell `i` draws from stream `i` of
/// `seed`, so the outcome does not depend on the thread count.
pub fn run_cells_parallel(
    mechanism: &Mechanism,
    cells: &mut [Cell],
    t_start: f64,
    t_stop: f64,
    seed: u64,
    props: SolverProps,
) -> Vec<SolverStats> {
    cells
        .par_iter_mut()
        .enumerate()
        .map(|(index, cell)| {
            let mut rng = RandomSource::for_stream(seed, index as u64);
            StochasticSolver::new(mechanism, props).run(cell, t_start, t_stop, &mut rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PhysicalConstants, ONE_ATM_PA};
    use crate::gas::{GasPhase, SpeciesTable};
    use crate::particle::{builtin_component, AggregationModel, ComponentKind, ParticleModel};
    use crate::process::TransitionCoagulation;

    #[test]
    fn test_parallel_matches_sequential_streams() {
        let model = ParticleModel::new(
            vec![builtin_component(ComponentKind::Titania).unwrap().clone()],
            AggregationModel::SurfaceVolume,
        );
        let mechanism = Mechanism::new(PhysicalConstants::default(), SpeciesTable::default(), model)
            .with_process(TransitionCoagulation::default());

        let mut cells: Vec<Cell> = (0..4)
            .map(|c| {
                let gas = GasPhase::with_air_viscosity(1200.0 + 100.0 * c as f64, ONE_ATM_PA, vec![]);
                let mut cell = Cell::new(gas, 128, 1.0e-15).unwrap();
                let mut rng = RandomSource::seeded(c);
                for i in 0..60 {
                    let d = 3.0e-9 * (1.0 + (i % 5) as f64);
                    cell.add_particle(mechanism.model().sphere_of_diameter(0, d, 0.0).unwrap(), &mut rng);
                }
                cell
            })
            .collect();
        let mut sequential = cells.clone();

        let parallel_stats = run_cells_parallel(&mechanism, &mut cells, 0.0, 2.0e-4, 42, SolverProps::default());

        let sequential_stats: Vec<SolverStats> = sequential
            .iter_mut()
            .enumerate()
            .map(|(index, cell)| {
                let mut rng = RandomSource::for_stream(42, index as u64);
                StochasticSolver::new(&mechanism, SolverProps::default()).run(cell, 0.0, 2.0e-4, &mut rng)
            })
            .collect();

        assert_eq!(parallel_stats, sequential_stats);
        for (a, b) in cells.iter().zip(sequential.iter()) {
            assert_eq!(a.particle_count(), b.particle_count());
            assert!(a.particles().iter().eq(b.particles().iter()));
        }
    }
}
