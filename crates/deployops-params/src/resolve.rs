//! Single-pass resolution of a stack's parameter block.

use crate::config::EnvironmentConfig;
use crate::error::ParamsError;
use crate::reference::ReferenceTable;
use crate::value::ParameterValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator used when flattening a sequence value.
pub const LIST_DELIMITER: &str = ",";

/// One fully-resolved parameter, serialized in the record shape deploy
/// tooling expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

/// A key dropped because its value had an unsupported shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedParameter {
    pub key: String,
    pub shape: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub parameters: Vec<ResolvedParameter>,
    pub skipped: Vec<SkippedParameter>,
}

/// Resolve `stack` from `config` against `table`.
pub fn resolve_stack(
    config: &EnvironmentConfig,
    stack: &str,
    table: &ReferenceTable,
) -> Result<Resolution, ParamsError> {
    let block = config.stack(stack)?;
    tracing::debug!(
        environment = config.environment(),
        stack,
        keys = block.len(),
        "resolving stack parameters"
    );
    resolve_block(block, table)
}

/// Resolve every key of `block` in document order.
///
/// Keys with unsupported shapes are skipped with a warning; unknown
/// references abort the pass.
pub fn resolve_block(
    block: &Map<String, Value>,
    table: &ReferenceTable,
) -> Result<Resolution, ParamsError> {
    let mut resolution = Resolution::default();
    for (key, raw) in block {
        let value = match ParameterValue::from_json(raw) {
            Ok(value) => value,
            Err(shape) => {
                tracing::warn!(
                    key = key.as_str(),
                    shape,
                    "skipping parameter with unsupported value"
                );
                resolution.skipped.push(SkippedParameter {
                    key: key.clone(),
                    shape,
                });
                continue;
            }
        };
        let value = resolve_value(key, &value, table)?;
        resolution.parameters.push(ResolvedParameter {
            key: key.clone(),
            value,
        });
    }
    Ok(resolution)
}

fn resolve_value(
    key: &str,
    value: &ParameterValue,
    table: &ReferenceTable,
) -> Result<String, ParamsError> {
    match value {
        ParameterValue::Text(text) => table.substitute(key, text),
        ParameterValue::List(items) => {
            let resolved = items
                .iter()
                .map(|item| table.substitute(key, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(resolved.join(LIST_DELIMITER))
        }
        ParameterValue::Number(number) => Ok(number.to_string()),
    }
}
