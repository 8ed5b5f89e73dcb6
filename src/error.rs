//! Error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the reconciliation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The staging file written by the UI does not exist.
    #[error("input file not found: {}", .path.display())]
    MissingInputFile {
        /// The expected path.
        path: PathBuf,
    },

    /// A non-blank staging file line is not a `key=value` pair.
    #[error("malformed input at line {line}: {content:?}")]
    MalformedInput {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },

    /// A supplied value does not match the format of its field.
    #[error("{field} {value}: invalid format")]
    InvalidFormat {
        /// Field name.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// Static addressing was requested without all of ip, mascara, gateway and dns1.
    #[error("static addressing requires ip, mascara, gateway and dns1")]
    IncompleteStaticConfig,

    /// `subida` or `bajada` is missing or empty.
    #[error("subida and bajada are mandatory")]
    MissingBandwidthLimits,

    /// A system-state source could not be opened.
    #[error("cannot read {}: {source}", .path.display())]
    SourceUnreadable {
        /// The source path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A system-state source did not contain the fields it is expected to hold.
    #[error("cannot locate expected settings in {}", .path.display())]
    SourceUnparseable {
        /// The source path.
        path: PathBuf,
    },

    /// Querying the live network stack failed or returned unexpected output.
    #[error("network query failed: {reason}")]
    NetworkQueryFailed {
        /// What went wrong.
        reason: String,
    },

    /// The OS refused to reload the network configuration.
    #[error("could not reload network configuration, check privileges: {reason}")]
    ReloadFailed {
        /// What went wrong.
        reason: String,
    },

    /// The deployment configuration file is unreadable or invalid.
    #[error("invalid deployment config {}: {reason}", .path.display())]
    Config {
        /// The config file path.
        path: PathBuf,
        /// Parser or I/O message.
        reason: String,
    },

    /// Writing an output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unreadable(path: &Path, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn query(reason: impl Into<String>) -> Self {
        Self::NetworkQueryFailed {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the UI-supplied staging file is at fault.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::MissingInputFile { .. }
                | Self::MalformedInput { .. }
                | Self::InvalidFormat { .. }
                | Self::IncompleteStaticConfig
                | Self::MissingBandwidthLimits
        )
    }

    /// Returns `true` if the failure points at the host environment rather
    /// than at user input.
    #[must_use]
    pub const fn is_environment(&self) -> bool {
        matches!(
            self,
            Self::SourceUnreadable { .. }
                | Self::SourceUnparseable { .. }
                | Self::NetworkQueryFailed { .. }
        )
    }

    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Io(e) | Self::SourceUnreadable { source: e, .. } => {
                e.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}
