//! Error types for treecompose
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Image request validation errors
///
/// Everything reachable from an untrusted image request file ends up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Image format name not recognized
    #[error("Unknown image format '{value}'")]
    UnknownFormat { value: String },

    /// Image format left unset
    #[error("Platform does not declare an image format")]
    FormatUnset,

    /// Compression tag not in the recognized set
    #[error("Unsupported compression type '{value}': must be empty or one of {supported:?}")]
    UnsupportedCompression {
        value: String,
        supported: Vec<String>,
    },

    /// Output filename is not a plain file name
    #[error("Invalid output filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    /// Stateroot name missing
    #[error("OS name must not be empty")]
    EmptyOsName,

    /// Ignition enabled without a platform id
    #[error("Ignition is enabled but no ignition platform id is set")]
    MissingIgnitionPlatform,

    /// Malformed OSTree ref
    #[error("Invalid ostree ref '{value}'")]
    InvalidRef { value: String },

    /// Malformed commit checksum
    #[error("Invalid commit checksum '{value}': expected 64 lowercase hex characters")]
    InvalidChecksum { value: String },

    /// Malformed remote name
    #[error("Invalid ostree remote name '{value}'")]
    InvalidRemoteName { value: String },

    /// Runner descriptor not recognized
    #[error("Invalid runner '{value}': expected fedora-<N>, rhel-<M>.<N>, centos-<N> or linux")]
    InvalidRunner { value: String },

    /// Image request could not be parsed
    #[error("Failed to parse image request: {0}")]
    Parse(String),
}

/// Pipeline graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Two pipelines share a name
    #[error("Pipeline '{name}' already exists in manifest")]
    DuplicatePipeline { name: String },

    /// Pipeline id does not belong to this manifest
    #[error("Pipeline #{index} does not exist in manifest")]
    UnknownPipeline { index: usize },

    /// Pipeline id refers to the wrong kind of pipeline
    #[error("Pipeline '{name}' is a {actual} pipeline, expected {expected}")]
    WrongPipelineKind {
        name: String,
        expected: String,
        actual: String,
    },

    /// JSON serialization failure
    #[error("Failed to serialize manifest: {0}")]
    Serialize(String),
}

/// Topology compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Format known to the platform but not wired into the compiler yet
    #[error("Image format '{format}' is not implemented for ostree disk images")]
    FormatNotImplemented { format: String },

    /// Manifest construction failed
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level treecompose error type
#[derive(Error, Debug)]
pub enum TreecomposeError {
    /// Image request error
    #[error("Image request error: {0}")]
    Spec(#[from] SpecError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Compile error
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}
