//! Error types for persistence operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while saving or loading projects and preset
/// files.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Failed to read a file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse TOML.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The project file's version field is not `MAJOR.MINOR.PATCH`.
    #[error("invalid project version: '{0}'")]
    InvalidVersion(String),

    /// The project was written by an incompatible major version.
    #[error("unsupported project version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: String,
        /// Version this build writes.
        supported: String,
    },

    /// A preset file names a port type that does not exist.
    #[error("unknown port type: '{0}'")]
    UnknownPortType(String),
}

impl ProjectError {
    /// Creates a read-file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a write-file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a create-directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
