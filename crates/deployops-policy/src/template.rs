//! CloudFormation YAML templates as JSON values.
//!
//! Short-form intrinsics (`!Ref`, `!Sub`, `!GetAtt`, ...) are expanded to the
//! long form the service renders, so measurements see what gets deployed
//! rather than the YAML shorthand.

use crate::error::PolicyError;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;
use std::fs;
use std::path::Path;

/// A parsed template with intrinsics in long form.
#[derive(Debug, Clone)]
pub struct Template {
    document: Value,
}

impl Template {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let yaml: Yaml = serde_yaml::from_str(&text).map_err(|source| PolicyError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(yaml)
    }

    pub fn from_yaml(yaml: Yaml) -> Result<Self, PolicyError> {
        Ok(Self {
            document: yaml_to_json(yaml, "$")?,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The `Resources` mapping, in template order.
    pub fn resources(&self) -> Result<&Map<String, Value>, PolicyError> {
        self.document
            .get("Resources")
            .and_then(Value::as_object)
            .ok_or(PolicyError::MissingResources)
    }
}

/// Convert a YAML value to JSON, expanding CloudFormation short-form tags.
pub fn yaml_to_json(value: Yaml, location: &str) -> Result<Value, PolicyError> {
    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => Value::Number(json_number(&number, location)?),
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| yaml_to_json(item, &format!("{location}[{index}]")))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, item) in mapping {
                let key = mapping_key(key, location)?;
                let child = yaml_to_json(item, &format!("{location}.{key}"))?;
                out.insert(key, child);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!').to_string();
            let inner = yaml_to_json(tagged.value, location)?;
            expand_intrinsic(&name, inner)
        }
    })
}

fn expand_intrinsic(name: &str, inner: Value) -> Value {
    let (key, value) = match name {
        "Ref" => ("Ref".to_string(), inner),
        "Condition" => ("Condition".to_string(), inner),
        "GetAtt" => {
            let value = match inner {
                Value::String(text) => match text.split_once('.') {
                    Some((resource, attribute)) => Value::Array(vec![
                        Value::String(resource.to_string()),
                        Value::String(attribute.to_string()),
                    ]),
                    None => Value::String(text),
                },
                other => other,
            };
            ("Fn::GetAtt".to_string(), value)
        }
        other => (format!("Fn::{other}"), inner),
    };
    let mut object = Map::new();
    object.insert(key, value);
    Value::Object(object)
}

fn mapping_key(key: Yaml, location: &str) -> Result<String, PolicyError> {
    match key {
        Yaml::String(text) => Ok(text),
        Yaml::Bool(flag) => Ok(flag.to_string()),
        Yaml::Number(number) => Ok(number.to_string()),
        other => Err(PolicyError::Unsupported {
            location: location.to_string(),
            detail: format!("non-scalar mapping key {other:?}"),
        }),
    }
}

fn json_number(number: &serde_yaml::Number, location: &str) -> Result<Number, PolicyError> {
    if let Some(value) = number.as_i64() {
        return Ok(Number::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Ok(Number::from(value));
    }
    number
        .as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| PolicyError::Unsupported {
            location: location.to_string(),
            detail: format!("non-finite number {number}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> Value {
        let yaml: Yaml = serde_yaml::from_str(text).expect("valid yaml");
        Template::from_yaml(yaml)
            .expect("template converts")
            .document()
            .clone()
    }

    #[test]
    fn short_form_tags_expand_to_long_form() {
        let doc = parse(
            r#"
a: !Ref Bucket
b: !Sub "arn:aws:s3:::${Bucket}/*"
c: !GetAtt Role.Arn
d: !Join [":", ["x", !Ref "AWS::Region"]]
e: !Condition IsProd
"#,
        );
        assert_eq!(
            doc,
            json!({
                "a": {"Ref": "Bucket"},
                "b": {"Fn::Sub": "arn:aws:s3:::${Bucket}/*"},
                "c": {"Fn::GetAtt": ["Role", "Arn"]},
                "d": {"Fn::Join": [":", ["x", {"Ref": "AWS::Region"}]]},
                "e": {"Condition": "IsProd"}
            })
        );
    }

    #[test]
    fn mapping_order_is_preserved() {
        let doc = parse("z: 1\na: 2\nm: 3\n");
        let keys: Vec<&String> = doc.as_object().expect("object").keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let doc = parse("2012: version\ntrue: flag\n");
        assert_eq!(doc, json!({"2012": "version", "true": "flag"}));
    }

    #[test]
    fn missing_resources_is_reported() {
        let yaml: Yaml = serde_yaml::from_str("Parameters: {}\n").expect("valid yaml");
        let template = Template::from_yaml(yaml).expect("converts");
        assert!(matches!(
            template.resources(),
            Err(PolicyError::MissingResources)
        ));
    }
}
