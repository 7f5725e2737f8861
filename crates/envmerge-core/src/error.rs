//! Error types for envmerge-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in envmerge-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file or directory
    #[error("failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file or create a directory
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy a file into the output tree
    #[error("failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input environment does not exist
    #[error("environment does not exist on path '{0}'")]
    MissingInput(PathBuf),

    /// The output directory exists and no free alternative name was found
    #[error("output directory '{0}' already exists")]
    OutputPathConflict(PathBuf),

    /// Neither environment has a Resources folder
    #[error("could not find a Resources folder in '{env1}' or '{env2}'")]
    MissingResourcesFolder { env1: PathBuf, env2: PathBuf },

    /// A metadata document does not have the root -> items container shape
    #[error("malformed metadata document '{path}': {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    /// XML syntax error from quick-xml
    #[error("XML error in '{path}': {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    /// Failed to serialize a merged document
    #[error("failed to serialize XML for '{path}': {message}")]
    XmlWrite { path: PathBuf, message: String },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error only affects a single metadata document.
    ///
    /// Recoverable errors are reported in the folder report and the merge
    /// carries on; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MalformedDocument { .. } | Error::Xml { .. })
    }
}
