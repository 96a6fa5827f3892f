//! Error types for template checks.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse change set {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported template content at {location}: {detail}")]
    Unsupported { location: String, detail: String },

    #[error("template has no Resources section")]
    MissingResources,

    #[error("resource `{0}` not found in template")]
    ResourceNotFound(String),

    #[error("resource `{0}` has no Properties.PolicyDocument")]
    NoPolicyDocument(String),
}
