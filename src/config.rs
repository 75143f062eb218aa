//! Scenario configuration, loaded from TOML.
//!
//! A scenario fully determines one artifact pair; there is no process-wide
//! state, so the same `GeneratorConfig` always yields byte-identical output.

use crate::core::lattice::DEFAULT_MASS;
use crate::core::{default_spacing, Bounds, DensityMode, GeometrySpec, OutputControls, Rounding, DIM};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to generate one particle/parameter artifact pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Base name of the artifacts: `<name>.in` and `<name>.par`.
    pub name: String,

    /// Simulated end time handed to the solver.
    pub time_end: f64,

    /// Solver timestep.
    pub timestep_length: f64,

    /// Solver cell size `h`.
    pub cell_size: f64,

    /// Particle spacing `s`; `cell_size / 2` when omitted.
    #[serde(default)]
    pub spacing: Option<f64>,

    /// Mass of every particle.
    #[serde(default = "default_mass")]
    pub mass: f64,

    pub density_mode: DensityMode,

    #[serde(default)]
    pub rounding: Rounding,

    /// Seeded sub-region.
    pub region: Bounds,

    /// Simulation domain.
    pub domain: Bounds,

    #[serde(default)]
    pub output: OutputControls,
}

fn default_mass() -> f64 {
    DEFAULT_MASS
}

impl GeneratorConfig {
    /// Parse a scenario from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), name = %cfg.name, "loaded scenario");
        Ok(cfg)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidParam(format!("scenario cannot be serialized: {e}")))
    }

    /// Effective particle spacing.
    pub fn spacing(&self) -> f64 {
        self.spacing.unwrap_or_else(|| default_spacing(self.cell_size))
    }

    /// Validated geometry of this scenario.
    pub fn geometry(&self) -> Result<GeometrySpec> {
        GeometrySpec::new(self.region, self.domain, self.cell_size, self.spacing())
    }

    pub fn particle_file_name(&self) -> String {
        format!("{}.in", self.name)
    }

    pub fn parameter_file_name(&self) -> String {
        format!("{}.par", self.name)
    }

    /// Built-in scenarios reproducing the reference dam setups.
    ///
    /// - `dam_coarse`: 10-unit cube at spacing 0.5 in a 30-unit domain, number density.
    /// - `dam_miles`: 0.2-unit cube at spacing 0.01 in a 0.5-unit domain, mass density.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "dam_coarse" => Some(Self {
                name: "dam_coarse".into(),
                time_end: 1.0,
                timestep_length: 0.01,
                cell_size: 1.0,
                spacing: None,
                mass: DEFAULT_MASS,
                density_mode: DensityMode::Number,
                rounding: Rounding::TiesEven,
                region: cube(10.0, 20.0),
                domain: cube(0.0, 30.0),
                output: OutputControls::default(),
            }),
            "dam_miles" => Some(Self {
                name: "dam_miles".into(),
                time_end: 10.0,
                timestep_length: 0.01,
                cell_size: 0.02,
                spacing: None,
                mass: DEFAULT_MASS,
                density_mode: DensityMode::Mass,
                rounding: Rounding::TiesEven,
                region: cube(0.2, 0.4),
                domain: cube(0.0, 0.5),
                output: OutputControls::default(),
            }),
            _ => None,
        }
    }

    /// Names accepted by [`GeneratorConfig::preset`].
    pub const PRESETS: [&'static str; 2] = ["dam_coarse", "dam_miles"];
}

fn cube(lo: f64, hi: f64) -> Bounds {
    Bounds {
        min: [lo; DIM],
        max: [hi; DIM],
    }
}
