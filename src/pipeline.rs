//! End-to-end generation: scenario in, artifact pair out.

use crate::config::GeneratorConfig;
use crate::core::{DerivedParameterCalculator, Lattice, LatticeGenerator, ParameterSet, DIM};
use crate::error::Result;
use crate::io::{parameter_lines, particle_lines, ArtifactSink};

/// A fully validated generation run, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub lattice: Lattice,
    pub params: ParameterSet,
    pub particle_file: String,
    pub parameter_file: String,
}

impl Plan {
    pub fn particle_count(&self) -> usize {
        self.lattice.len()
    }

    pub fn lattice_counts(&self) -> [usize; DIM] {
        self.lattice.counts()
    }
}

/// Validate `config` and derive everything the artifacts will contain.
///
/// Pure: no file is touched, so every geometry or parameter error surfaces
/// before the first byte is written.
pub fn prepare(config: &GeneratorConfig) -> Result<Plan> {
    let geometry = config.geometry()?;
    let generator = LatticeGenerator::new()
        .with_mass(config.mass)?
        .with_rounding(config.rounding);
    let lattice = generator.plan(geometry.region(), geometry.spacing())?;

    let derived = DerivedParameterCalculator::new(config.rounding).compute(
        lattice.len(),
        geometry.region().volume(),
        geometry.domain(),
        geometry.cell_size(),
        config.density_mode,
    )?;
    let particle_file = config.particle_file_name();
    let params = ParameterSet::new(
        particle_file.clone(),
        config.time_end,
        config.timestep_length,
        *geometry.domain(),
        derived,
        config.output.clone(),
    )?;

    Ok(Plan {
        lattice,
        params,
        particle_file,
        parameter_file: config.parameter_file_name(),
    })
}

/// Generate the artifact pair for `config` into `sink` and commit it.
///
/// Particles are streamed straight from the lattice into the sink.
pub fn run<S: ArtifactSink>(config: &GeneratorConfig, sink: &mut S) -> Result<Plan> {
    let plan = prepare(config)?;
    let [nx, ny, nz] = plan.lattice_counts();
    tracing::info!(
        name = %config.name,
        particles = plan.particle_count(),
        nx,
        ny,
        nz,
        density = plan.params.density,
        mode = ?config.density_mode,
        "generating artifacts"
    );

    sink.write_artifact(
        &plan.particle_file,
        particle_lines(plan.particle_count(), plan.lattice.iter()),
    )?;
    sink.write_artifact(&plan.parameter_file, parameter_lines(&plan.params))?;
    sink.commit()?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DensityMode;
    use crate::error::Error;
    use crate::io::MemorySink;

    fn preset(name: &str) -> GeneratorConfig {
        GeneratorConfig::preset(name).expect("preset exists")
    }

    #[test]
    fn coarse_dam_plan() -> Result<()> {
        let plan = prepare(&preset("dam_coarse"))?;
        assert_eq!(plan.lattice_counts(), [21, 21, 21]);
        assert_eq!(plan.particle_count(), 9261);
        assert_eq!(plan.params.cell_count, [30, 30, 30]);
        assert_eq!(plan.params.density, 9.261);
        assert_eq!(plan.params.part_input_file, "dam_coarse.in");
        Ok(())
    }

    #[test]
    fn run_writes_both_artifacts() -> Result<()> {
        let mut sink = MemorySink::new();
        run(&preset("dam_coarse"), &mut sink)?;
        let particles = sink.lines("dam_coarse.in").expect("particle artifact");
        assert_eq!(particles.len(), 9262);
        assert_eq!(particles[0], "9261");
        assert_eq!(particles[1], "1.0 0.5 10.0 10.0 10.0 0.0 0.0 0.0");
        assert_eq!(particles[9261], "1.0 0.5 20.0 20.0 20.0 0.0 0.0 0.0");
        let params = sink.lines("dam_coarse.par").expect("parameter artifact");
        assert_eq!(params[0], "part_input_file       dam_coarse.in");
        Ok(())
    }

    #[test]
    fn invalid_geometry_writes_nothing() {
        let mut cfg = preset("dam_coarse");
        cfg.region.max[1] = cfg.region.min[1];
        let mut sink = MemorySink::new();
        let err = run(&cfg, &mut sink).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
        assert_eq!(sink.names().count(), 0);
    }

    #[test]
    fn density_mode_is_taken_from_config() -> Result<()> {
        let mut cfg = preset("dam_coarse");
        cfg.density_mode = DensityMode::Mass;
        assert_eq!(prepare(&cfg)?.params.density, 9261.0 * 1000.0);
        Ok(())
    }
}
