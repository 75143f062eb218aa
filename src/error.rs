use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for lattice generation and artifact handling.
///
/// Every variant is fatal to a generation run. Messages name the offending
/// axis or file so a failed run can be diagnosed from the message alone.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-positive or non-finite extent or volume.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Non-positive cell size or particle spacing, or a domain axis that
    /// resolves to zero cells.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(String),

    /// Any other invalid configuration value (mass, time parameters, names).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Writing or committing one of the output artifacts failed.
    #[error("failed to write artifact '{}': {source}", path.display())]
    ArtifactWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file (scenario or artifact) could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed content while reading an artifact back.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Scenario file could not be deserialized.
    #[error(transparent)]
    Config(#[from] toml::de::Error),

    /// Other propagated I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
