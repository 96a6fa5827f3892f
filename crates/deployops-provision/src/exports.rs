//! Cross-stack exports published by the infrastructure layer.

use crate::command::ToolCall;
use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(
        rename = "ExportingStackId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub exporting_stack_id: Option<String>,
}

impl Export {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            exporting_stack_id: None,
        }
    }
}

/// One page of `list-exports` output.
#[derive(Debug, Default, Deserialize)]
struct ExportsPage {
    #[serde(rename = "Exports", default)]
    exports: Vec<Export>,
    #[serde(rename = "NextToken", default)]
    next_token: Option<String>,
}

/// Source of every export visible to one environment.
pub trait ExportRegistry {
    fn list_exports(&self) -> Result<Vec<Export>, ProvisionError>;

    /// Human-readable origin used in logs.
    fn describe(&self) -> String;
}

/// Exports fetched through `aws cloudformation list-exports`.
#[derive(Debug, Clone)]
pub struct AwsCliExports {
    profile: String,
}

impl AwsCliExports {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

impl ExportRegistry for AwsCliExports {
    fn list_exports(&self) -> Result<Vec<Export>, ProvisionError> {
        tracing::info!(profile = self.profile.as_str(), "getting exports");
        let mut all = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut args = vec![
                "cloudformation".to_string(),
                "list-exports".to_string(),
                "--profile".to_string(),
                self.profile.clone(),
                "--output".to_string(),
                "json".to_string(),
                "--no-paginate".to_string(),
            ];
            if let Some(token) = next_token.take() {
                args.push("--next-token".to_string());
                args.push(token);
            }
            let stdout = ToolCall::new("aws", args).run()?;
            let page: ExportsPage =
                serde_json::from_str(&stdout).map_err(|err| ProvisionError::Parse {
                    program: "aws",
                    message: err.to_string(),
                })?;
            all.extend(page.exports);
            match page.next_token.filter(|token| !token.is_empty()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(all)
    }

    fn describe(&self) -> String {
        format!("aws profile {}", self.profile)
    }
}

/// Exports captured earlier as `list-exports` JSON.
#[derive(Debug, Clone)]
pub struct FileExports {
    path: PathBuf,
}

impl FileExports {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ExportRegistry for FileExports {
    fn list_exports(&self) -> Result<Vec<Export>, ProvisionError> {
        let bytes = fs::read(&self.path).map_err(|source| ProvisionError::Read {
            path: self.path.clone(),
            source,
        })?;
        let page: ExportsPage =
            serde_json::from_slice(&bytes).map_err(|source| ProvisionError::ExportsParse {
                path: self.path.clone(),
                source,
            })?;
        Ok(page.exports)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// All exports of one environment, queried by name.
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    exports: Vec<Export>,
}

impl ExportSet {
    pub fn new(exports: Vec<Export>) -> Self {
        Self { exports }
    }

    pub fn fetch(registry: &dyn ExportRegistry) -> Result<Self, ProvisionError> {
        let exports = registry.list_exports()?;
        tracing::debug!(source = %registry.describe(), count = exports.len(), "loaded exports");
        Ok(Self::new(exports))
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Value of the first export called `name`.
    ///
    /// Missing exports are an error only when `required`.
    pub fn named(&self, name: &str, required: bool) -> Result<Option<String>, ProvisionError> {
        let value = self
            .exports
            .iter()
            .find(|export| export.name == name)
            .map(|export| export.value.clone());
        if required && value.is_none() {
            return Err(ProvisionError::MissingExport(name.to_string()));
        }
        Ok(value)
    }
}
