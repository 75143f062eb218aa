//! Initial conditions for SPH-style particle solvers.
//!
//! Fills a rectangular sub-region with a uniform lattice of equal-mass
//! particles and writes it, together with a parameter file describing the
//! enclosing domain, as the text artifact pair the solver reads:
//!
//! - [`core`]: geometry validation, lattice enumeration, derived parameters.
//! - [`io`]: artifact rendering, sinks and readers.
//! - [`config`]: TOML scenarios.
//! - [`pipeline`]: scenario to committed artifact pair.
//!
//! With the `python` feature the crate also builds a Python extension module.

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;

#[cfg(feature = "python")]
mod python;

pub use crate::config::GeneratorConfig;
pub use crate::error::{Error, Result};
