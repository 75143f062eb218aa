//! Pure computation: geometry validation, lattice enumeration and derived
//! solver parameters. Nothing in here touches the filesystem.

pub mod geometry;
pub mod lattice;
pub mod params;
pub mod particle;
pub mod rounding;

pub use geometry::{default_spacing, Axis, Bounds, GeometrySpec, DIM};
pub use lattice::{Lattice, LatticeGenerator};
pub use params::{
    DensityMode, DerivedParameterCalculator, DerivedParameters, OutputControls, ParameterSet,
};
pub use particle::Particle;
pub use rounding::Rounding;
