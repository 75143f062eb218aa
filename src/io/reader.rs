//! Readers for the two artifacts, following the solver's own parsing rules:
//! whitespace-separated tokens, unknown parameter keys skipped.

use crate::core::{
    Bounds, DensityMode, DerivedParameters, OutputControls, ParameterSet, Particle, DIM,
};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn parse_err(path: &Path, line: usize, reason: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_num<T: FromStr>(path: &Path, line: usize, what: &str, token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| parse_err(path, line, format!("cannot parse {what} from {token:?}")))
}

/// Read a particle artifact.
pub fn read_particles(path: &Path) -> Result<Vec<Particle>> {
    let text = read_text(path)?;
    parse_particles(path, &text)
}

/// Parse particle artifact content. `path` is only used in error messages.
pub fn parse_particles(path: &Path, text: &str) -> Result<Vec<Particle>> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| parse_err(path, 1, "empty particle file"))?;
    let count: usize = parse_num(path, 1, "particle count", header.trim())?;

    let mut particles = Vec::with_capacity(count);
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 8 {
            return Err(parse_err(
                path,
                line_no,
                format!("expected 8 fields, found {}", fields.len()),
            ));
        }
        let mut nums = [0.0f64; 8];
        for (slot, token) in nums.iter_mut().zip(&fields) {
            *slot = parse_num(path, line_no, "particle field", token)?;
        }
        let p = Particle::new(
            nums[0],
            nums[1],
            [nums[2], nums[3], nums[4]],
            [nums[5], nums[6], nums[7]],
        )
        .map_err(|e| parse_err(path, line_no, e.to_string()))?;
        particles.push(p);
    }

    if particles.len() != count {
        return Err(parse_err(
            path,
            1,
            format!("header announces {count} particles, found {}", particles.len()),
        ));
    }
    Ok(particles)
}

/// Read a parameter artifact.
pub fn read_parameters(path: &Path) -> Result<ParameterSet> {
    let text = read_text(path)?;
    parse_parameters(path, &text)
}

/// Parse parameter artifact content. `path` is only used in error messages.
pub fn parse_parameters(path: &Path, text: &str) -> Result<ParameterSet> {
    let mut values: HashMap<&str, (usize, &str)> = HashMap::new();
    let mut last_line = 0;
    for (i, line) in text.lines().enumerate() {
        last_line = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        let Some(value) = tokens.next() else {
            return Err(parse_err(path, i + 1, format!("missing value for {key:?}")));
        };
        values.insert(key, (i + 1, value));
    }

    let mut take = |key: &str| {
        values
            .remove(key)
            .ok_or_else(|| parse_err(path, last_line, format!("missing key {key:?}")))
    };
    let real = |(line, tok): (usize, &str), key: &str| parse_num::<f64>(path, line, key, tok);
    let count = |(line, tok): (usize, &str), key: &str| -> Result<usize> {
        // The solver reads cell counts as reals; accept "30" as well as "30.0".
        if let Ok(n) = tok.parse::<usize>() {
            return Ok(n);
        }
        let x: f64 = parse_num(path, line, key, tok)?;
        if x.fract() != 0.0 || x < 0.0 {
            return Err(parse_err(path, line, format!("{key} must be a whole number, got {tok}")));
        }
        Ok(x as usize)
    };
    let opt_u32 = |v: Option<(usize, &str)>, key: &str| -> Result<Option<u32>> {
        v.map(|(line, tok)| parse_num::<u32>(path, line, key, tok)).transpose()
    };

    let part_input_file = take("part_input_file")?.1.to_owned();
    let time_end = real(take("time_end")?, "time_end")?;
    let timestep_length = real(take("timestep_length")?, "timestep_length")?;
    let mut min = [0.0; DIM];
    let mut max = [0.0; DIM];
    let mut cell_count = [0usize; DIM];
    for (k, axis) in ["x", "y", "z"].into_iter().enumerate() {
        let lo = format!("{axis}_min");
        let hi = format!("{axis}_max");
        let n = format!("{axis}_n");
        min[k] = real(take(lo.as_str())?, lo.as_str())?;
        max[k] = real(take(hi.as_str())?, hi.as_str())?;
        cell_count[k] = count(take(n.as_str())?, n.as_str())?;
    }
    let density = real(take("density")?, "density")?;

    let output = OutputControls {
        part_out_freq: opt_u32(values.remove("part_out_freq"), "part_out_freq")?,
        part_out_name_base: values.remove("part_out_name_base").map(|v| v.1.to_owned()),
        vtk_out_freq: opt_u32(values.remove("vtk_out_freq"), "vtk_out_freq")?,
        vtk_out_name_base: values.remove("vtk_out_name_base").map(|v| v.1.to_owned()),
        cl_workgroup_1dsize: opt_u32(values.remove("cl_workgroup_1dsize"), "cl_workgroup_1dsize")?,
    };
    for (key, (line, _)) in &values {
        tracing::warn!(file = %path.display(), line, key, "unknown parameter, leaving it out");
    }

    ParameterSet::new(
        part_input_file,
        time_end,
        timestep_length,
        Bounds { min, max },
        DerivedParameters {
            cell_count,
            density,
        },
        output,
    )
}

/// Outcome of checking an artifact pair for mutual consistency.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub parameter_file: PathBuf,
    pub particle_file: PathBuf,
    pub particle_count: usize,
    /// Distinct coordinates per axis; a complete lattice has `product == particle_count`.
    pub lattice_counts: [usize; DIM],
    /// Density formula reproducing the recorded `density` from the realised
    /// lattice extent, if any.
    pub density_mode: Option<DensityMode>,
    /// Human-readable inconsistencies; empty for a sound pair.
    pub issues: Vec<String>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

const REL_TOL: f64 = 1e-9;

/// Locate the particle file named by a parameter file. A relative name is
/// tried against the parameter file's directory and then each of its
/// ancestors, since the name may already carry the subdirectory the pair was
/// written to.
fn resolve_particle_file(parameter_file: &Path, name: &str) -> PathBuf {
    let base = parameter_file.parent().unwrap_or_else(|| Path::new(""));
    base.ancestors()
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
        .unwrap_or_else(|| base.join(name))
}

/// Read a parameter artifact and the particle artifact it names, and check
/// that they describe the same lattice.
///
/// The particle path is tried against the parameter file's directory and then
/// its ancestors.
/// I/O and parse failures are errors; semantic mismatches are collected in
/// [`VerifyReport::issues`].
pub fn verify(parameter_file: &Path) -> Result<VerifyReport> {
    let params = read_parameters(parameter_file)?;
    let particle_file = resolve_particle_file(parameter_file, &params.part_input_file);
    let particles = read_particles(&particle_file)?;
    let mut issues = Vec::new();

    let mut axes: [Vec<f64>; DIM] = Default::default();
    for p in &particles {
        for (k, coords) in axes.iter_mut().enumerate() {
            coords.push(p.r[k]);
        }
    }
    for coords in axes.iter_mut() {
        coords.sort_by(f64::total_cmp);
        coords.dedup();
    }
    let lattice_counts = [axes[0].len(), axes[1].len(), axes[2].len()];
    let full: usize = lattice_counts.iter().product();
    if full != particles.len() {
        issues.push(format!(
            "{} particles do not form a full {lattice_counts:?} lattice",
            particles.len()
        ));
    }

    if particles.windows(2).any(|w| w[0].r >= w[1].r) {
        issues.push("particles are not in lexicographic (x, y, z) order".into());
    }
    if let Some(first) = particles.first() {
        if particles.iter().any(|p| p.radius != first.radius) {
            issues.push("particle radius varies across the lattice".into());
        }
        if particles.iter().any(|p| p.mass != first.mass) {
            issues.push("particle mass varies across the lattice".into());
        }
    }
    let domain = params.domain;
    if particles
        .iter()
        .any(|p| (0..DIM).any(|k| p.r[k] < domain.min[k] || p.r[k] > domain.max[k]))
    {
        issues.push("some particles lie outside the simulation domain".into());
    }

    if params.cell_count.contains(&0) {
        issues.push("cell count is zero on some axis".into());
    }

    // The configured sub-region is not recorded, only the realised lattice.
    // With `n` points at spacing `s` the configured width lies within
    // `[(n - 1.5) s, (n - 0.5) s]`, which brackets the volume each density
    // formula could have used.
    let density_mode = particles.first().and_then(|p| {
        let s = p.radius;
        let (mut v_lo, mut v_hi) = (1.0, 1.0);
        for &n in &lattice_counts {
            let steps = n as f64 - 1.0;
            v_lo *= ((steps - 0.5).max(0.0)) * s;
            v_hi *= (steps + 0.5) * s;
        }
        let n = particles.len();
        let within = |lo: f64, hi: f64| {
            let d = params.density;
            d >= lo * (1.0 - REL_TOL) && d <= hi * (1.0 + REL_TOL)
        };
        let number_hi = if v_lo > 0.0 {
            DensityMode::Number.apply(n, v_lo)
        } else {
            f64::INFINITY
        };
        if within(DensityMode::Number.apply(n, v_hi), number_hi) {
            Some(DensityMode::Number)
        } else if within(DensityMode::Mass.apply(n, v_lo), DensityMode::Mass.apply(n, v_hi)) {
            Some(DensityMode::Mass)
        } else {
            None
        }
    });
    if !particles.is_empty() && density_mode.is_none() {
        issues.push(format!(
            "density {:?} matches neither N/V nor N*V for N = {} on a {lattice_counts:?} lattice",
            params.density,
            particles.len()
        ));
    }

    Ok(VerifyReport {
        parameter_file: parameter_file.to_path_buf(),
        particle_file,
        particle_count: particles.len(),
        lattice_counts,
        density_mode,
        issues,
    })
}
