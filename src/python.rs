use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

use crate::config::GeneratorConfig;
use crate::core::{Bounds, LatticeGenerator, Rounding, DIM};
use crate::io::{parameter_lines, DirectorySink};
use crate::pipeline;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_dim(name: &str, v: Vec<f64>) -> PyResult<[f64; DIM]> {
    <[f64; DIM]>::try_from(v.as_slice())
        .map_err(|_| py_err(format!("{name} must have length {DIM}, got {}", v.len())))
}

fn parse_rounding(s: &str) -> PyResult<Rounding> {
    match s {
        "ties-even" => Ok(Rounding::TiesEven),
        "ties-away" => Ok(Rounding::TiesAway),
        other => Err(py_err(format!(
            "rounding must be 'ties-even' or 'ties-away', got {other:?}"
        ))),
    }
}

/// Lattice positions for a sub-region as a NumPy array of shape (N, 3), in output order.
///
/// Parameters
/// - region_min, region_max: iterables of 3 floats with min < max per axis
/// - spacing: lattice spacing (> 0)
/// - rounding: "ties-even" (default) or "ties-away"
///
/// Errors: raises ValueError on invalid geometry.
#[pyfunction]
#[pyo3(signature = (region_min, region_max, spacing, rounding="ties-even"))]
fn lattice_positions<'py>(
    py: Python<'py>,
    region_min: Vec<f64>,
    region_max: Vec<f64>,
    spacing: f64,
    rounding: &str,
) -> PyResult<Py<PyArray2<f64>>> {
    let region = Bounds {
        min: to_dim("region_min", region_min)?,
        max: to_dim("region_max", region_max)?,
    };
    let lattice = LatticeGenerator::new()
        .with_rounding(parse_rounding(rounding)?)
        .plan(&region, spacing)
        .map_err(py_err)?;
    let mut arr = Array2::<f64>::zeros((lattice.len(), DIM));
    for (i, p) in lattice.iter().enumerate() {
        for k in 0..DIM {
            arr[[i, k]] = p.r[k];
        }
    }
    Ok(arr.into_pyarray(py).to_owned().into())
}

/// A generation scenario, loaded from TOML text, a file, or a built-in preset.
#[pyclass]
pub struct Scenario {
    config: GeneratorConfig,
}

#[pymethods]
impl Scenario {
    /// Parse a scenario from TOML text. Raises ValueError on malformed input.
    #[new]
    fn new(toml_text: &str) -> PyResult<Self> {
        let config = GeneratorConfig::from_toml_str(toml_text).map_err(py_err)?;
        Ok(Self { config })
    }

    /// Load a scenario file.
    #[staticmethod]
    fn load(path: PathBuf) -> PyResult<Self> {
        let config = GeneratorConfig::load(&path).map_err(py_err)?;
        Ok(Self { config })
    }

    /// Built-in scenario by name ("dam_coarse", "dam_miles").
    #[staticmethod]
    fn preset(name: &str) -> PyResult<Self> {
        let config = GeneratorConfig::preset(name)
            .ok_or_else(|| py_err(format!("unknown preset {name:?}")))?;
        Ok(Self { config })
    }

    #[getter]
    fn name(&self) -> String {
        self.config.name.clone()
    }

    /// Per-axis particle counts (nx, ny, nz).
    fn lattice_counts(&self) -> PyResult<(usize, usize, usize)> {
        let [nx, ny, nz] = pipeline::prepare(&self.config).map_err(py_err)?.lattice_counts();
        Ok((nx, ny, nz))
    }

    /// Parameter artifact content as a dict {key: value-string}, in file order.
    fn parameters<'py>(&self, py: Python<'py>) -> PyResult<Py<PyDict>> {
        let plan = pipeline::prepare(&self.config).map_err(py_err)?;
        let out = PyDict::new(py);
        for line in parameter_lines(&plan.params) {
            let mut it = line.split_whitespace();
            if let (Some(k), Some(v)) = (it.next(), it.next()) {
                out.set_item(k, v)?;
            }
        }
        Ok(out.into())
    }

    /// Write `<name>.in` and `<name>.par` into `out_dir` (releases the GIL while writing).
    ///
    /// Returns the paths of the particle and parameter artifacts.
    fn write(&self, py: Python<'_>, out_dir: PathBuf) -> PyResult<(PathBuf, PathBuf)> {
        let config = self.config.clone();
        py.detach(move || {
            let mut sink = DirectorySink::new(&out_dir)?;
            let plan = pipeline::run(&config, &mut sink)?;
            Ok::<_, crate::error::Error>((
                sink.path_of(&plan.particle_file),
                sink.path_of(&plan.parameter_file),
            ))
        })
        .map_err(py_err)
    }
}

/// The latticegen Python module entry point.
#[pymodule]
fn latticegen(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(lattice_positions, m)?)?;
    m.add_class::<Scenario>()?;
    Ok(())
}
