//! Error types for parameter resolution.

use crate::encoding::OutputEncoding;
use crate::reference::ReferenceKind;
use std::path::PathBuf;

/// Errors that abort a resolution run.
///
/// Malformed individual parameter values are not errors; they are reported
/// through [`crate::SkippedParameter`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("invalid parameters file: {} not found", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("invalid parameters file: failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameters file: failed to parse {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid stack: `{stack}` has no parameters in environment `{environment}`")]
    StackNotFound { environment: String, stack: String },

    #[error("invalid stack: parameters for `{stack}` must be an object")]
    StackNotObject { stack: String },

    #[error("malformed {label} mapping: {source}")]
    MalformedMapping {
        label: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("parameter `{key}` references unknown {kind} `{name}`")]
    UnknownReference {
        key: String,
        kind: ReferenceKind,
        name: String,
    },

    #[error("parameter `{key}` cannot be rendered as {encoding}: {reason}")]
    UnsafeValue {
        key: String,
        encoding: OutputEncoding,
        reason: &'static str,
    },

    #[error("failed to serialize parameters: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
