// Aluminum flame demo
// A cooling post-flame column: aluminium droplets coagulate, burn at the
// surface and lose vapour while the gas temperature falls.

use aerosol_sweep_rust::constants::ONE_ATM_PA;
use aerosol_sweep_rust::particle::PropertyKey;
use aerosol_sweep_rust::{
    Cell, GasPhase, MechanismConfig, RandomSource, Result, SolverProps, StochasticSolver,
};

const STEPS: usize = 10;
const STEP_S: f64 = 2.0e-4;

fn main() -> Result<()> {
    println!("🔥 Aluminum flame demo");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/aluminum_flame.json".to_string());
    let mechanism = MechanismConfig::load(&config_path)?.build()?;
    println!("   Loaded {} processes from {}", mechanism.processes().len(), config_path);

    // N2, O2, AL(L), AL2O3 in mol/m³
    let gas = GasPhase::with_air_viscosity(3000.0, ONE_ATM_PA, vec![30.0, 1.0e-3, 0.2, 0.0]);
    let mut cell = Cell::new(gas, 512, 1.0e-15)?;
    let mut rng = RandomSource::seeded(2024);
    for i in 0..300 {
        let diameter = 2.0e-8 * (1.0 + (i % 10) as f64);
        if let Some(particle) = mechanism.model().sphere_of_diameter(0, diameter, 0.0) {
            cell.add_particle(particle, &mut rng);
        }
    }

    let solver = StochasticSolver::new(&mechanism, SolverProps::default());
    println!(
        "{:>4} {:>8} {:>6} {:>9} {:>9} {:>12} {:>12}",
        "step", "T (K)", "n", "merges", "fict %", "Al units", "Al2O3 units"
    );
    for step in 0..STEPS {
        let t_start = step as f64 * STEP_S;
        let temperature = 3000.0 - 100.0 * step as f64;
        cell.gas_mut().set_temperature(temperature);
        cell.gas_mut().set_viscosity(aerosol_sweep_rust::constants::air_viscosity(temperature));
        // Aluminium vapour condenses out as the column cools.
        let vapour = 0.2 * (1.0 - step as f64 / STEPS as f64);
        cell.gas_mut().set_concentrations(vec![30.0, 1.0e-3, vapour, 0.0]);

        let stats = solver.run(&mut cell, t_start, t_start + STEP_S, &mut rng);

        let (aluminum, alumina) = cell.particles().iter().fold((0.0, 0.0), |(al, ox), p| {
            (al + p.component_units(0), ox + p.component_units(1))
        });
        println!(
            "{:>4} {:>8.0} {:>6} {:>9} {:>9.1} {:>12.4e} {:>12.4e}",
            step,
            temperature,
            cell.particle_count(),
            stats.successes,
            100.0 * stats.fictitious_fraction(),
            aluminum,
            alumina
        );
    }

    let mean_diameter = cell.particles().sums().property(PropertyKey::CollisionDiameter)
        / cell.particle_count().max(1) as f64;
    println!("   Mean collision diameter: {:.2} nm", mean_diameter * 1.0e9);
    println!("   Number density: {:.3e} m⁻³", cell.number_density());
    println!("✅ Done");
    Ok(())
}
