use crate::core::geometry::DIM;
use crate::error::{Error, Result};

/// A lattice particle as consumed by the downstream solver.
///
/// Fields:
/// - `mass`: particle mass (> 0)
/// - `radius`: particle radius (> 0), equal to the lattice spacing
/// - `r`: position vector [x, y, z]
/// - `v`: velocity vector [vx, vy, vz]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Mass (> 0).
    pub mass: f64,
    /// Radius (> 0).
    pub radius: f64,
    /// Position (x, y, z).
    pub r: [f64; DIM],
    /// Velocity (vx, vy, vz).
    pub v: [f64; DIM],
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(mass: f64, radius: f64, r: [f64; DIM], v: [f64; DIM]) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self { mass, radius, r, v })
    }

    /// A particle at rest. Callers guarantee `mass` and `radius` were validated.
    #[inline]
    pub(crate) fn at_rest(mass: f64, radius: f64, r: [f64; DIM]) -> Self {
        Self {
            mass,
            radius,
            r,
            v: [0.0; DIM],
        }
    }
}
