//! Change-set review: resources that would be replaced or removed.

use crate::error::PolicyError;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const UNKNOWN_LOGICAL_ID: &str = "<unknown logical id>";
const UNKNOWN_PHYSICAL_ID: &str = "<unknown physical id>";
const UNKNOWN_TYPE: &str = "<unknown type>";

/// A resource change that needs a human to look at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedChange {
    pub logical_id: String,
    pub physical_id: String,
    pub resource_type: String,
    pub reason: String,
}

pub fn load_change_set(path: impl AsRef<Path>) -> Result<Value, PolicyError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PolicyError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Changes whose replacement is `True`/`Conditional`, or whose action is
/// `Remove`. A document without a `Changes` array has nothing to flag.
pub fn flagged_changes(change_set: &Value) -> Vec<FlaggedChange> {
    let Some(changes) = change_set.get("Changes").and_then(Value::as_array) else {
        return Vec::new();
    };
    changes.iter().filter_map(flag_change).collect()
}

fn flag_change(change: &Value) -> Option<FlaggedChange> {
    let resource_change = change.get("ResourceChange")?;
    let replacement = text_of(resource_change.get("Replacement")).unwrap_or_default();
    let action = resource_change.get("Action").and_then(Value::as_str);

    let needs_replacement = replacement == "True" || replacement == "Conditional";
    let reason = if needs_replacement {
        format!("Replacement: {replacement}")
    } else if action == Some("Remove") {
        "Action: Remove".to_string()
    } else {
        return None;
    };

    Some(FlaggedChange {
        logical_id: text_of(resource_change.get("LogicalResourceId"))
            .unwrap_or_else(|| UNKNOWN_LOGICAL_ID.to_string()),
        physical_id: text_of(resource_change.get("PhysicalResourceId"))
            .unwrap_or_else(|| UNKNOWN_PHYSICAL_ID.to_string()),
        resource_type: text_of(resource_change.get("ResourceType"))
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
        reason,
    })
}

fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_replacements_and_removals_only() {
        let change_set = json!({
            "Changes": [
                {"ResourceChange": {
                    "Action": "Modify", "Replacement": "True",
                    "LogicalResourceId": "Table", "PhysicalResourceId": "tbl-1",
                    "ResourceType": "AWS::DynamoDB::Table"
                }},
                {"ResourceChange": {
                    "Action": "Modify", "Replacement": "Conditional",
                    "LogicalResourceId": "Fn"
                }},
                {"ResourceChange": {
                    "Action": "Modify", "Replacement": "False",
                    "LogicalResourceId": "Quiet"
                }},
                {"ResourceChange": {
                    "Action": "Remove", "LogicalResourceId": "Gone",
                    "ResourceType": "AWS::SQS::Queue"
                }},
                {"Type": "Resource"}
            ]
        });

        let flagged = flagged_changes(&change_set);
        assert_eq!(
            flagged,
            vec![
                FlaggedChange {
                    logical_id: "Table".to_string(),
                    physical_id: "tbl-1".to_string(),
                    resource_type: "AWS::DynamoDB::Table".to_string(),
                    reason: "Replacement: True".to_string(),
                },
                FlaggedChange {
                    logical_id: "Fn".to_string(),
                    physical_id: UNKNOWN_PHYSICAL_ID.to_string(),
                    resource_type: UNKNOWN_TYPE.to_string(),
                    reason: "Replacement: Conditional".to_string(),
                },
                FlaggedChange {
                    logical_id: "Gone".to_string(),
                    physical_id: UNKNOWN_PHYSICAL_ID.to_string(),
                    resource_type: "AWS::SQS::Queue".to_string(),
                    reason: "Action: Remove".to_string(),
                },
            ]
        );
    }

    #[test]
    fn replacement_wins_over_removal_reason() {
        let change_set = json!({"Changes": [{"ResourceChange": {
            "Action": "Remove", "Replacement": "True"
        }}]});
        assert_eq!(flagged_changes(&change_set)[0].reason, "Replacement: True");
    }

    #[test]
    fn non_string_replacement_is_stringified() {
        let change_set = json!({"Changes": [{"ResourceChange": {"Replacement": true}}]});
        assert!(flagged_changes(&change_set).is_empty());
    }

    #[test]
    fn missing_changes_array_flags_nothing() {
        assert!(flagged_changes(&json!({})).is_empty());
        assert!(flagged_changes(&json!({"Changes": "nope"})).is_empty());
    }

    #[test]
    fn load_reports_parse_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("changes.json");
        std::fs::write(&path, "not json").expect("written");
        assert!(matches!(
            load_change_set(&path),
            Err(PolicyError::Json { .. })
        ));
    }
}
