//! Accepted parameter value shapes.

use serde_json::{Number, Value};

/// A parameter value in one of the three accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Text(String),
    List(Vec<String>),
    Number(Number),
}

impl ParameterValue {
    /// Classify a raw JSON value, naming the offending shape on failure.
    pub fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Number(number) => Ok(Self::Number(number.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(ToOwned::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Self::List)
                .ok_or("sequence with non-string elements"),
            Value::Bool(_) => Err("boolean"),
            Value::Null => Err("null"),
            Value::Object(_) => Err("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_strings_lists_and_numbers() {
        assert_eq!(
            ParameterValue::from_json(&json!("a")),
            Ok(ParameterValue::Text("a".to_string()))
        );
        assert_eq!(
            ParameterValue::from_json(&json!(["a", "b"])),
            Ok(ParameterValue::List(vec!["a".to_string(), "b".to_string()]))
        );
        assert!(matches!(
            ParameterValue::from_json(&json!(42)),
            Ok(ParameterValue::Number(_))
        ));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(ParameterValue::from_json(&json!(true)), Err("boolean"));
        assert_eq!(ParameterValue::from_json(&json!(null)), Err("null"));
        assert_eq!(ParameterValue::from_json(&json!({"a": 1})), Err("object"));
        assert_eq!(
            ParameterValue::from_json(&json!(["a", 1])),
            Err("sequence with non-string elements")
        );
    }
}
