//! Error types for dependency tree builds.
//!
//! Two tiers, mirroring how a scan behaves:
//!
//! - **`LineageError`**: failures about the build target, the codebase root or a
//!   tree query. These always reach the caller.
//! - **`ParseWarning`**: a scanned file could not be turned into entities. It is
//!   recorded on the index and attached to the finished tree, never raised.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::{EntityKind, NodeId};

/// Result type for lineage operations.
pub type Result<T> = std::result::Result<T, LineageError>;

#[derive(Debug, Error)]
pub enum LineageError {
    /// The requested target does not exist in the given file.
    #[error("entity '{name}' of type '{kind}' not found in {}", path.display())]
    EntityNotFound {
        name: String,
        kind: EntityKind,
        path: PathBuf,
    },

    /// Target file or codebase root is missing or unreadable.
    #[error("source path {} is not usable: {reason}", path.display())]
    SourcePath { path: PathBuf, reason: String },

    /// The target's own file could not be parsed.
    #[error("cannot load target file: {0}")]
    Parse(ParseWarning),

    /// A tree query used an id that this tree never issued.
    #[error("node {0} is not part of this dependency tree")]
    NodeNotFound(NodeId),

    /// The tree-sitter grammar could not be loaded.
    #[error("parser unavailable: {0}")]
    ParserUnavailable(String),
}

impl LineageError {
    pub fn source_path(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::SourcePath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a file contributed no entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarningKind {
    /// Source has syntax errors.
    Syntax,
    /// File could not be read.
    Io,
    /// File content is not valid UTF-8.
    Encoding,
}

impl fmt::Display for ParseWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax error"),
            Self::Io => write!(f, "I/O error"),
            Self::Encoding => write!(f, "encoding error"),
        }
    }
}

/// A file that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseWarning {
    pub path: PathBuf,
    pub kind: ParseWarningKind,
    pub message: String,
}

impl ParseWarning {
    pub fn new(path: impl Into<PathBuf>, kind: ParseWarningKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(path: impl Into<PathBuf>, line: usize) -> Self {
        Self::new(
            path,
            ParseWarningKind::Syntax,
            format!("invalid syntax near line {line}"),
        )
    }

    pub fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::InvalidData {
            return Self::new(path, ParseWarningKind::Encoding, "file is not valid UTF-8");
        }
        Self::new(path, ParseWarningKind::Io, error.to_string())
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path.display(), self.message, self.kind)
    }
}

impl std::error::Error for ParseWarning {}
