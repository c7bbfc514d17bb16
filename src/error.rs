//! Error types for schema hoisting and equivalence checking.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Which document a divergent location was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Original,
    Transformed,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Original => f.write_str("original"),
            Side::Transformed => f.write_str("transformed"),
        }
    }
}

/// First difference found between resolved original and transformed documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Divergence {
    /// Location exists in exactly one document; `side` is where it is present.
    Missing { path: String, side: Side },
    /// Location exists in both but the resolved structure differs.
    Mismatch {
        path: String,
        original: String,
        transformed: String,
    },
}

impl Divergence {
    /// JSON Pointer of the first offending location.
    pub fn path(&self) -> &str {
        match self {
            Divergence::Missing { path, .. } | Divergence::Mismatch { path, .. } => path,
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Missing { path, side } => {
                write!(f, "{} is only present in the {} document", path, side)
            }
            Divergence::Mismatch {
                path,
                original,
                transformed,
            } => write!(
                f,
                "{} differs: original {}, transformed {}",
                path, original, transformed
            ),
        }
    }
}

/// Errors during hoisting, merging, checking, or document I/O.
#[derive(Debug, Error)]
pub enum HoistError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid document: {source}")]
    InvalidDocument {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot serialize document: {message}")]
    Serialize { message: String },

    // Transformation errors (exit code 1)
    #[error("no definitions table at {path} to insert {count} extracted schema(s) into")]
    StructuralPrecondition { path: String, count: usize },

    #[error("extracted schema name \"{name}\" collides with an existing definition")]
    NameCollision { name: String },

    #[error("transformed document is not equivalent: {0}")]
    EquivalenceDivergence(Divergence),
}

impl HoistError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            HoistError::FileNotFound { .. }
            | HoistError::ReadError { .. }
            | HoistError::WriteError { .. } => 3,
            #[cfg(feature = "remote")]
            HoistError::NetworkError { .. } => 3,
            HoistError::InvalidDocument { .. } | HoistError::Serialize { .. } => 2,
            _ => 1,
        }
    }
}
