//! Text artifacts: rendering, sinks and readers.
//!
//! The particle artifact (`<name>.in`) and the parameter artifact
//! (`<name>.par`) are written as plain lines through an [`ArtifactSink`], so
//! the core stays free of file handling and tests can capture output in memory.

pub mod format;
pub mod reader;
pub mod sink;

pub use format::{parameter_lines, particle_lines, KEY_COLUMN};
pub use reader::{read_parameters, read_particles, verify, VerifyReport};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};
