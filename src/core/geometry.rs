use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed spatial dimension (3D).
pub const DIM: usize = 3;

/// Coordinate axis, used to name the offending axis in error messages and to
/// derive the per-axis parameter keys (`x_min`, `y_n`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in enumeration order (axis 0 first).
    pub const ALL: [Axis; DIM] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Lowercase axis label as used in the parameter artifact.
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} axis", self.label())
    }
}

/// Axis-aligned box given by its lower and upper corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower corner (x, y, z).
    pub min: [f64; DIM],
    /// Upper corner (x, y, z).
    pub max: [f64; DIM],
}

impl Bounds {
    /// Create bounds after checking `min < max` (both finite) on every axis.
    ///
    /// `what` names the box in error messages ("sub-region", "domain").
    pub fn new(what: &str, min: [f64; DIM], max: [f64; DIM]) -> Result<Self> {
        let b = Self { min, max };
        b.validate(what)?;
        Ok(b)
    }

    /// Check `min < max` with finite values on every axis.
    pub fn validate(&self, what: &str) -> Result<()> {
        for axis in Axis::ALL {
            let k = axis.index();
            let (lo, hi) = (self.min[k], self.max[k]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(Error::InvalidGeometry(format!(
                    "{what} bounds on the {axis} must be finite (min {lo:?}, max {hi:?})"
                )));
            }
            if lo >= hi {
                return Err(Error::InvalidGeometry(format!(
                    "{what} on the {axis}: min {lo:?} must be < max {hi:?}"
                )));
            }
        }
        Ok(())
    }

    /// Edge length along `axis`.
    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        self.max[axis.index()] - self.min[axis.index()]
    }

    /// Edge lengths along all axes.
    pub fn extents(&self) -> [f64; DIM] {
        Axis::ALL.map(|a| self.extent(a))
    }

    /// Product of the edge lengths.
    pub fn volume(&self) -> f64 {
        self.extents().iter().product()
    }

    /// Whether `other` lies entirely inside (or on the boundary of) `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        (0..DIM).all(|k| self.min[k] <= other.min[k] && other.max[k] <= self.max[k])
    }
}

/// Immutable description of the seeded sub-region and the enclosing domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySpec {
    region: Bounds,
    domain: Bounds,
    cell_size: f64,
    spacing: f64,
}

impl GeometrySpec {
    /// Validate and assemble a geometry.
    ///
    /// Errors:
    /// - `Error::InvalidGeometry` if either box has `min >= max` on any axis.
    /// - `Error::InvalidCellSize` if `cell_size` or `spacing` is non-positive.
    ///
    /// A sub-region reaching outside the domain is accepted; the solver will
    /// simply lose those particles, so it is only reported as a warning.
    pub fn new(region: Bounds, domain: Bounds, cell_size: f64, spacing: f64) -> Result<Self> {
        region.validate("sub-region")?;
        domain.validate("domain")?;
        check_positive("cell size", cell_size)?;
        check_positive("particle spacing", spacing)?;
        if !domain.contains(&region) {
            tracing::warn!(
                region_min = ?region.min,
                region_max = ?region.max,
                domain_min = ?domain.min,
                domain_max = ?domain.max,
                "sub-region is not contained in the simulation domain"
            );
        }
        Ok(Self {
            region,
            domain,
            cell_size,
            spacing,
        })
    }

    pub fn region(&self) -> &Bounds {
        &self.region
    }

    pub fn domain(&self) -> &Bounds {
        &self.domain
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }
}

/// Conventional particle spacing for a given cell size: two particles per cell edge.
pub fn default_spacing(cell_size: f64) -> f64 {
    cell_size / 2.0
}

pub(crate) fn check_positive(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidCellSize(format!(
            "{what} must be finite and > 0, got {value:?}"
        )));
    }
    Ok(())
}
