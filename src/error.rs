//! Process exit codes and errors that end a run before any scanning starts.
//!
//! Everything else (unreadable files, failed deletions) is recovered per path
//! and only shows up in counts and diagnostics.

use std::path::PathBuf;

use serde::Serialize;

/// Exit codes for the dupsift binary.
///
/// - 0: Success (completed normally, with or without duplicates)
/// - 1: General error (configuration, missing root, terminal failure)
/// - 3: Partial success (at least one requested deletion failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed. Zero duplicates is still a success.
    Success = 0,
    /// An unrecoverable error stopped the run.
    GeneralError = 1,
    /// Some deletions failed while the rest went through.
    PartialSuccess = 3,
    /// Interrupted between pipeline stages.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for a run whose deletions may have partially failed.
    #[must_use]
    pub fn from_deletion_failures(failures: usize) -> Self {
        if failures == 0 {
            Self::Success
        } else {
            Self::PartialSuccess
        }
    }
}

/// Unrecoverable problems detected before the pipeline starts.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// A requested root does not exist.
    #[error("Root path does not exist: {0}")]
    RootNotFound(PathBuf),

    /// A requested root exists but is not a directory.
    #[error("Root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// A requested root could not be resolved.
    #[error("Cannot access root {path}: {source}")]
    RootInaccessible {
        /// The offending root
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
