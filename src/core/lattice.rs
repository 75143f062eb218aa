use crate::core::geometry::{check_positive, Axis, Bounds, DIM};
use crate::core::particle::Particle;
use crate::core::rounding::Rounding;
use crate::error::{Error, Result};

/// Default particle mass of a generated lattice.
pub const DEFAULT_MASS: f64 = 1.0;

/// Enumerates equal-mass particles on a uniform grid filling a sub-region.
///
/// Along an axis of width `w` the lattice holds `round(w / s) + 1` points at
/// `min + i * s`. Because the count is rounded rather than floored, the last
/// point may sit slightly past `max` when `w / s` is not integral; downstream
/// solvers tolerate this and the exact counts must be preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeGenerator {
    mass: f64,
    rounding: Rounding,
}

impl Default for LatticeGenerator {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            rounding: Rounding::default(),
        }
    }
}

impl LatticeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `mass` for every generated particle.
    ///
    /// Errors: `Error::InvalidParam` if `mass` is non-positive or not finite.
    pub fn with_mass(mut self, mass: f64) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "particle mass must be finite and > 0, got {mass:?}"
            )));
        }
        self.mass = mass;
        Ok(self)
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Resolve the lattice layout for `region` at `spacing` without
    /// materialising any particle.
    ///
    /// Errors:
    /// - `Error::InvalidCellSize` if `spacing` is non-positive.
    /// - `Error::InvalidGeometry` if any axis has a non-positive extent.
    /// - `Error::InvalidParam` if the particle count does not fit in memory indices.
    pub fn plan(&self, region: &Bounds, spacing: f64) -> Result<Lattice> {
        check_positive("particle spacing", spacing)?;
        region.validate("sub-region")?;

        let mut counts = [0usize; DIM];
        for axis in Axis::ALL {
            let q = region.extent(axis) / spacing;
            let rounded = self.rounding.round(q);
            if !rounded.is_finite() || rounded >= u32::MAX as f64 {
                return Err(Error::InvalidParam(format!(
                    "{axis}: {q:?} lattice steps is too many to enumerate"
                )));
            }
            counts[axis.index()] = rounded as usize + 1;
            tracing::debug!(
                axis = axis.label(),
                extent = region.extent(axis),
                spacing,
                count = counts[axis.index()],
                "lattice axis resolved"
            );
        }

        let len = counts
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| {
                Error::InvalidParam(format!("lattice of {counts:?} particles overflows usize"))
            })?;

        Ok(Lattice {
            origin: region.min,
            spacing,
            counts,
            len,
            mass: self.mass,
        })
    }

    /// Per-axis particle counts for `region` at `spacing`.
    pub fn counts(&self, region: &Bounds, spacing: f64) -> Result<[usize; DIM]> {
        Ok(self.plan(region, spacing)?.counts())
    }

    /// Generate every particle of the lattice, in output order.
    pub fn generate(&self, region: &Bounds, spacing: f64) -> Result<Vec<Particle>> {
        let lattice = self.plan(region, spacing)?;
        let particles: Vec<Particle> = lattice.iter().collect();
        tracing::info!(
            count = particles.len(),
            nx = lattice.counts[0],
            ny = lattice.counts[1],
            nz = lattice.counts[2],
            spacing,
            "generated particle lattice"
        );
        Ok(particles)
    }
}

/// A resolved lattice layout: origin, spacing and per-axis counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    origin: [f64; DIM],
    spacing: f64,
    counts: [usize; DIM],
    len: usize,
    mass: f64,
}

impl Lattice {
    pub fn counts(&self) -> [usize; DIM] {
        self.counts
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Total number of particles, `nx * ny * nz`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of lattice point `(i, j, k)`.
    ///
    /// Each coordinate is `origin + index * spacing`; positions are never
    /// accumulated step by step, so no rounding drift builds up along an axis.
    #[inline]
    pub fn position(&self, index: [usize; DIM]) -> [f64; DIM] {
        let mut r = [0.0; DIM];
        for (k, r_k) in r.iter_mut().enumerate() {
            *r_k = self.origin[k] + index[k] as f64 * self.spacing;
        }
        r
    }

    /// Lattice index of the `n`-th particle in output order (axis 2 fastest).
    #[inline]
    pub fn index_of(&self, n: usize) -> [usize; DIM] {
        let [_, ny, nz] = self.counts;
        [n / (ny * nz), (n / nz) % ny, n % nz]
    }

    /// Lazily enumerate the particles in output order.
    pub fn iter(&self) -> LatticeIter {
        LatticeIter {
            lattice: *self,
            next: 0,
        }
    }
}

impl IntoIterator for &Lattice {
    type Item = Particle;
    type IntoIter = LatticeIter;

    fn into_iter(self) -> LatticeIter {
        self.iter()
    }
}

/// Iterator over the particles of a [`Lattice`] in lexicographic `(i, j, k)` order.
#[derive(Debug, Clone)]
pub struct LatticeIter {
    lattice: Lattice,
    next: usize,
}

impl Iterator for LatticeIter {
    type Item = Particle;

    fn next(&mut self) -> Option<Particle> {
        if self.next >= self.lattice.len {
            return None;
        }
        let idx = self.lattice.index_of(self.next);
        self.next += 1;
        Some(Particle::at_rest(
            self.lattice.mass,
            self.lattice.spacing,
            self.lattice.position(idx),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.lattice.len - self.next;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for LatticeIter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(lo: f64, hi: f64) -> Bounds {
        Bounds {
            min: [lo; DIM],
            max: [hi; DIM],
        }
    }

    #[test]
    fn counts_round_to_nearest() -> Result<()> {
        let gen = LatticeGenerator::new();
        // 1.04 / 0.1 = 10.4 -> 10 steps -> 11 points; 1.06 / 0.1 -> 11 steps -> 12 points.
        let region = Bounds {
            min: [0.0; DIM],
            max: [1.04, 1.06, 0.05],
        };
        assert_eq!(gen.counts(&region, 0.1)?, [11, 12, 2]);
        Ok(())
    }

    #[test]
    fn spacing_wider_than_region_still_yields_a_point() -> Result<()> {
        let gen = LatticeGenerator::new();
        assert_eq!(gen.counts(&cube(0.0, 0.1), 5.0)?, [1, 1, 1]);
        let p = gen.generate(&cube(0.0, 0.1), 5.0)?;
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].r, [0.0; DIM]);
        Ok(())
    }

    #[test]
    fn tie_rounding_changes_the_count() -> Result<()> {
        // 5 / 2 = 2.5 exactly.
        let region = cube(0.0, 5.0);
        let even = LatticeGenerator::new().counts(&region, 2.0)?;
        let away = LatticeGenerator::new()
            .with_rounding(Rounding::TiesAway)
            .counts(&region, 2.0)?;
        assert_eq!(even, [3, 3, 3]);
        assert_eq!(away, [4, 4, 4]);
        Ok(())
    }

    #[test]
    fn innermost_axis_varies_fastest() -> Result<()> {
        let region = Bounds {
            min: [0.0; DIM],
            max: [1.0, 1.0, 2.0],
        };
        let p = LatticeGenerator::new().generate(&region, 1.0)?;
        let rs: Vec<[f64; DIM]> = p.iter().map(|p| p.r).collect();
        assert_eq!(
            rs,
            vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 2.0],
                [0.0, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [0.0, 1.0, 2.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 1.0],
                [1.0, 0.0, 2.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, 2.0],
            ]
        );
        Ok(())
    }

    #[test]
    fn attributes_follow_generator() -> Result<()> {
        let gen = LatticeGenerator::new().with_mass(2.5)?;
        for p in gen.generate(&cube(0.0, 1.0), 0.25)? {
            assert_eq!(p.mass, 2.5);
            assert_eq!(p.radius, 0.25);
            assert_eq!(p.v, [0.0; DIM]);
        }
        Ok(())
    }

    #[test]
    fn positions_are_multiplied_not_accumulated() -> Result<()> {
        let lattice = LatticeGenerator::new().plan(&cube(0.2, 0.4), 0.01)?;
        assert_eq!(lattice.position([7, 0, 13]), [0.2 + 7.0 * 0.01, 0.2, 0.2 + 13.0 * 0.01]);
        Ok(())
    }

    #[test]
    fn index_of_inverts_enumeration() -> Result<()> {
        let region = Bounds {
            min: [0.0; DIM],
            max: [2.0, 3.0, 4.0],
        };
        let lattice = LatticeGenerator::new().plan(&region, 1.0)?;
        let mut n = 0;
        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    assert_eq!(lattice.index_of(n), [i, j, k]);
                    n += 1;
                }
            }
        }
        assert_eq!(n, lattice.len());
        Ok(())
    }

    #[test]
    fn iterator_reports_exact_size() -> Result<()> {
        let lattice = LatticeGenerator::new().plan(&cube(10.0, 20.0), 0.5)?;
        let mut it = lattice.iter();
        assert_eq!(it.len(), 9261);
        it.next();
        assert_eq!(it.len(), 9260);
        Ok(())
    }

    #[test]
    fn degenerate_region_rejected() {
        let region = Bounds {
            min: [0.0, 0.0, 0.3],
            max: [1.0, 1.0, 0.3],
        };
        let err = LatticeGenerator::new().generate(&region, 0.1).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
        assert!(err.to_string().contains("z axis"), "{err}");
    }

    #[test]
    fn non_positive_spacing_rejected() {
        let err = LatticeGenerator::new().generate(&cube(0.0, 1.0), 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidCellSize(_)));
    }

    #[test]
    fn invalid_mass_rejected() {
        let err = LatticeGenerator::new().with_mass(-1.0).unwrap_err();
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn absurd_lattice_rejected() {
        let err = LatticeGenerator::new()
            .generate(&cube(0.0, 1.0), 1e-12)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
    }
}
