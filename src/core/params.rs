use crate::core::geometry::{check_positive, Axis, Bounds, DIM};
use crate::core::rounding::Rounding;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How the bulk `density` parameter is derived from the lattice.
///
/// The two reference setups use opposite formulas for similar inputs and
/// neither can be shown to be the defective one, so callers pick explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityMode {
    /// Particles per unit volume: `N / V`. Used for coarse tracer lattices.
    Number,
    /// Accumulated concentration of a fine lattice: `N * V`.
    Mass,
}

impl DensityMode {
    /// Apply the formula. `volume` must already be validated as positive.
    #[inline]
    pub fn apply(self, particle_count: usize, volume: f64) -> f64 {
        let n = particle_count as f64;
        match self {
            DensityMode::Number => n / volume,
            DensityMode::Mass => n * volume,
        }
    }
}

/// Quantities recomputed from the generated lattice on every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParameters {
    /// Solver cells per axis.
    pub cell_count: [usize; DIM],
    /// Bulk density in the chosen [`DensityMode`].
    pub density: f64,
}

/// Computes domain cell counts and bulk density.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedParameterCalculator {
    rounding: Rounding,
}

impl DerivedParameterCalculator {
    pub fn new(rounding: Rounding) -> Self {
        Self { rounding }
    }

    /// Cells per axis: `round((domain_max - domain_min) / cell_size)`.
    ///
    /// Errors: `Error::InvalidCellSize` if `cell_size` is non-positive or an
    /// axis resolves to zero cells.
    pub fn cell_count(&self, domain: &Bounds, cell_size: f64) -> Result<[usize; DIM]> {
        check_positive("cell size", cell_size)?;
        let mut n = [0usize; DIM];
        for axis in Axis::ALL {
            let q = self.rounding.round(domain.extent(axis) / cell_size);
            if !q.is_finite() || q >= u32::MAX as f64 {
                return Err(Error::InvalidCellSize(format!(
                    "{axis}: cell size {cell_size:?} yields {q:?} cells"
                )));
            }
            if q < 1.0 {
                return Err(Error::InvalidCellSize(format!(
                    "{axis}: domain extent {:?} holds no whole cell of size {cell_size:?}",
                    domain.extent(axis)
                )));
            }
            n[axis.index()] = q as usize;
        }
        Ok(n)
    }

    /// Derive cell counts and density.
    ///
    /// Errors:
    /// - `Error::InvalidCellSize` if `cell_size <= 0`.
    /// - `Error::InvalidGeometry` if `sub_region_volume <= 0` (or not finite).
    pub fn compute(
        &self,
        particle_count: usize,
        sub_region_volume: f64,
        domain: &Bounds,
        cell_size: f64,
        mode: DensityMode,
    ) -> Result<DerivedParameters> {
        if !sub_region_volume.is_finite() || sub_region_volume <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "sub-region volume must be finite and > 0, got {sub_region_volume:?}"
            )));
        }
        let cell_count = self.cell_count(domain, cell_size)?;
        let density = mode.apply(particle_count, sub_region_volume);
        tracing::debug!(?cell_count, density, ?mode, "derived solver parameters");
        Ok(DerivedParameters {
            cell_count,
            density,
        })
    }
}

/// Optional output controls understood by the solver's parameter reader.
///
/// Emitted after `density` only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputControls {
    pub part_out_freq: Option<u32>,
    pub part_out_name_base: Option<String>,
    pub vtk_out_freq: Option<u32>,
    pub vtk_out_name_base: Option<String>,
    pub cl_workgroup_1dsize: Option<u32>,
}

impl OutputControls {
    /// `(key, value)` pairs for the controls that are set, in artifact order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = self.part_out_freq {
            out.push(("part_out_freq", v.to_string()));
        }
        if let Some(v) = &self.part_out_name_base {
            out.push(("part_out_name_base", v.clone()));
        }
        if let Some(v) = self.vtk_out_freq {
            out.push(("vtk_out_freq", v.to_string()));
        }
        if let Some(v) = &self.vtk_out_name_base {
            out.push(("vtk_out_name_base", v.clone()));
        }
        if let Some(v) = self.cl_workgroup_1dsize {
            out.push(("cl_workgroup_1dsize", v.to_string()));
        }
        out
    }
}

/// Everything written to the parameter artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    /// File name of the paired particle artifact.
    pub part_input_file: String,
    pub time_end: f64,
    pub timestep_length: f64,
    pub domain: Bounds,
    pub cell_count: [usize; DIM],
    pub density: f64,
    pub output: OutputControls,
}

impl ParameterSet {
    /// Assemble a parameter set from configuration and derived quantities.
    ///
    /// Errors: `Error::InvalidParam` for non-positive time parameters or an
    /// artifact name the solver cannot read back (empty or containing whitespace).
    pub fn new(
        part_input_file: impl Into<String>,
        time_end: f64,
        timestep_length: f64,
        domain: Bounds,
        derived: DerivedParameters,
        output: OutputControls,
    ) -> Result<Self> {
        let part_input_file = part_input_file.into();
        check_token("part_input_file", &part_input_file)?;
        for (key, name) in [
            ("part_out_name_base", &output.part_out_name_base),
            ("vtk_out_name_base", &output.vtk_out_name_base),
        ] {
            if let Some(name) = name {
                check_token(key, name)?;
            }
        }
        for (key, v) in [("time_end", time_end), ("timestep_length", timestep_length)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{key} must be finite and > 0, got {v:?}"
                )));
            }
        }
        domain.validate("domain")?;
        Ok(Self {
            part_input_file,
            time_end,
            timestep_length,
            domain,
            cell_count: derived.cell_count,
            density: derived.density,
            output,
        })
    }
}

// The solver reads values with whitespace tokenisation.
fn check_token(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidParam(format!(
            "{key} must be a non-empty name without whitespace, got {value:?}"
        )));
    }
    Ok(())
}
