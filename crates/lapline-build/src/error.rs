//! Error type for the consolidation pipeline

use std::path::{Path, PathBuf};

/// Error from building a table out of persisted artifacts.
///
/// None of these are recoverable per row: one bad artifact fails the build.
#[derive(Debug)]
pub enum BuildError {
    /// Artifact is not JSON or lacks an expected field
    SchemaMismatch { path: PathBuf, reason: String },
    /// Reading artifacts or writing the table failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Nothing persisted for the endpoint
    NoArtifacts { dir: PathBuf },
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaMismatch { path, reason } => {
                write!(f, "schema mismatch in {}: {reason}", path.display())
            }
            Self::Io { path, source } => write!(f, "IO: {}: {source}", path.display()),
            Self::NoArtifacts { dir } => write!(f, "no JSON artifacts under {}", dir.display()),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl BuildError {
    pub(crate) fn mismatch(path: &Path, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
