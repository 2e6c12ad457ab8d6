pub mod cell;
pub mod config;
pub mod constants;
pub mod ensemble;
pub mod error;
pub mod gas;
pub mod mechanism;
pub mod particle;
pub mod process;
pub mod random;
pub mod sim;

pub use cell::Cell;
pub use config::MechanismConfig;
pub use ensemble::Ensemble;
pub use error::{Result, SweepError};
pub use gas::{GasPhase, SpeciesTable};
pub use mechanism::Mechanism;
pub use particle::{Particle, ParticleModel, PropertyCache, PropertyKey, Weighting};
pub use process::{NoOpReason, ParticleProcess, PerformStatus, Process, SelectionFailure};
pub use random::RandomSource;
pub use sim::{run_cells_parallel, SolverProps, SolverStats, StochasticSolver};
