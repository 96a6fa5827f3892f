//! Secret and variable references.
//!
//! A leaf string is a reference when it starts with `SECRET.` or `VAR.`.
//! Everything else is a literal and passes through untouched.

use crate::error::ParamsError;
use std::collections::BTreeMap;
use std::fmt;

pub const SECRET_PREFIX: &str = "SECRET.";
pub const VARIABLE_PREFIX: &str = "VAR.";

/// Which lookup table a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Secret,
    Variable,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret => f.write_str("secret"),
            Self::Variable => f.write_str("variable"),
        }
    }
}

/// A classified leaf string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    Secret(&'a str),
    Variable(&'a str),
    Literal(&'a str),
}

impl<'a> Reference<'a> {
    /// Classify `raw`. The secret prefix wins when both could apply.
    pub fn parse(raw: &'a str) -> Self {
        if let Some(name) = raw.strip_prefix(SECRET_PREFIX) {
            Self::Secret(name)
        } else if let Some(name) = raw.strip_prefix(VARIABLE_PREFIX) {
            Self::Variable(name)
        } else {
            Self::Literal(raw)
        }
    }
}

/// Caller-supplied secret and variable mappings for one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    secrets: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
}

impl ReferenceTable {
    pub fn new(secrets: BTreeMap<String, String>, variables: BTreeMap<String, String>) -> Self {
        Self { secrets, variables }
    }

    /// Build a table from serialized JSON objects.
    ///
    /// Blank input stands for an empty mapping.
    pub fn from_json(secrets: &str, variables: &str) -> Result<Self, ParamsError> {
        Ok(Self {
            secrets: parse_mapping(secrets, "secret")?,
            variables: parse_mapping(variables, "variable")?,
        })
    }

    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Resolve one leaf string belonging to parameter `key`.
    ///
    /// Unknown names fail the whole run rather than resolving to an empty
    /// string.
    pub fn substitute(&self, key: &str, raw: &str) -> Result<String, ParamsError> {
        let (kind, name, table) = match Reference::parse(raw) {
            Reference::Literal(text) => return Ok(text.to_string()),
            Reference::Secret(name) => (ReferenceKind::Secret, name, &self.secrets),
            Reference::Variable(name) => (ReferenceKind::Variable, name, &self.variables),
        };
        table
            .get(name)
            .cloned()
            .ok_or_else(|| ParamsError::UnknownReference {
                key: key.to_string(),
                kind,
                name: name.to_string(),
            })
    }
}

fn parse_mapping(
    text: &str,
    label: &'static str,
) -> Result<BTreeMap<String, String>, ParamsError> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(text).map_err(|source| ParamsError::MalformedMapping { label, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::from_json(r#"{"foo":"s3cret"}"#, r#"{"bar":"plain"}"#)
            .expect("mappings should parse")
    }

    #[test]
    fn parse_classifies_prefixes() {
        assert_eq!(Reference::parse("SECRET.a"), Reference::Secret("a"));
        assert_eq!(Reference::parse("VAR.b"), Reference::Variable("b"));
        assert_eq!(Reference::parse("secret.a"), Reference::Literal("secret.a"));
        assert_eq!(Reference::parse("SECRETS"), Reference::Literal("SECRETS"));
    }

    #[test]
    fn secret_prefix_is_tested_first() {
        assert_eq!(
            Reference::parse("SECRET.VAR.x"),
            Reference::Secret("VAR.x")
        );
    }

    #[test]
    fn substitute_resolves_both_tables() {
        let table = table();
        assert_eq!(table.substitute("K", "SECRET.foo").unwrap(), "s3cret");
        assert_eq!(table.substitute("K", "VAR.bar").unwrap(), "plain");
        assert_eq!(table.substitute("K", "unchanged").unwrap(), "unchanged");
    }

    #[test]
    fn substitute_rejects_unknown_names() {
        let err = table().substitute("Key1", "VAR.missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter `Key1` references unknown variable `missing`"
        );
    }

    #[test]
    fn blank_mappings_are_empty() {
        let table = ReferenceTable::from_json("", "  \n").expect("blank mappings parse");
        assert_eq!(table.secret_count(), 0);
        assert_eq!(table.variable_count(), 0);
    }

    #[test]
    fn non_object_mappings_are_malformed() {
        let err = ReferenceTable::from_json("[1,2]", "{}").unwrap_err();
        assert!(matches!(
            err,
            ParamsError::MalformedMapping { label: "secret", .. }
        ));

        let err = ReferenceTable::from_json("{}", r#"{"n": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            ParamsError::MalformedMapping {
                label: "variable",
                ..
            }
        ));
    }
}
