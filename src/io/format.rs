use crate::core::{Axis, Particle, ParameterSet};

/// Width of the left-aligned key column in the parameter artifact.
pub const KEY_COLUMN: usize = 22;

/// Lines of the particle artifact: the count, then one particle per line as
/// `mass radius x y z vx vy vz`.
///
/// Reals use the shortest representation that parses back to the same `f64`,
/// so the artifact is byte-stable across runs and lossless.
pub fn particle_lines<I>(count: usize, particles: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = Particle>,
{
    std::iter::once(count.to_string()).chain(particles.into_iter().map(|p| particle_line(&p)))
}

fn particle_line(p: &Particle) -> String {
    format!(
        "{:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
        p.mass, p.radius, p.r[0], p.r[1], p.r[2], p.v[0], p.v[1], p.v[2]
    )
}

/// Lines of the parameter artifact in the order the solver documents them.
pub fn parameter_lines(params: &ParameterSet) -> Vec<String> {
    let mut entries: Vec<(&str, String)> = vec![
        ("part_input_file", params.part_input_file.clone()),
        ("time_end", format!("{:?}", params.time_end)),
        ("timestep_length", format!("{:?}", params.timestep_length)),
    ];
    let bound_keys = [
        ("x_min", "x_max"),
        ("y_min", "y_max"),
        ("z_min", "z_max"),
    ];
    for axis in Axis::ALL {
        let (lo, hi) = bound_keys[axis.index()];
        entries.push((lo, format!("{:?}", params.domain.min[axis.index()])));
        entries.push((hi, format!("{:?}", params.domain.max[axis.index()])));
    }
    for (key, n) in ["x_n", "y_n", "z_n"].into_iter().zip(params.cell_count) {
        entries.push((key, n.to_string()));
    }
    entries.push(("density", format!("{:?}", params.density)));
    entries.extend(params.output.entries());

    entries
        .into_iter()
        .map(|(key, value)| format!("{key:<width$}{value}", width = KEY_COLUMN))
        .collect()
}
