//! Error types for provisioning.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("{program} executable is not available in PATH")]
    ToolNotInstalled { program: &'static str },

    #[error("{program} command failed: {program} {args} ({message})")]
    CommandFailed {
        program: &'static str,
        args: String,
        message: String,
    },

    #[error("unable to parse {program} output: {message}")]
    Parse {
        program: &'static str,
        message: String,
    },

    #[error("export {0} is required but not found")]
    MissingExport(String),

    #[error("no exports loaded for environment `{0}`")]
    MissingExportSet(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse exports {}: {source}", path.display())]
    ExportsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid provisioning config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid provisioning config: {0}")]
    InvalidConfig(String),

    #[error("invalid secret name `{0}`")]
    InvalidSecretName(String),

    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),
}
