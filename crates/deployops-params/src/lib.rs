//! # Deployops parameters
//!
//! Resolves a stack's deployment parameters for one environment.
//!
//! ```text
//! <config-dir>/<env>.json ── parameters.<stack> ──┐
//!                                                 ├─ resolve ─ render ─ text | <env>-<stack>-params.json
//! secret / variable mappings ─────────────────────┘
//! ```
//!
//! Leaf strings of the form `SECRET.<name>` and `VAR.<name>` are looked up in
//! the caller's mappings; sequences are flattened with `,`; numbers become
//! their decimal text. Keys with any other value shape are skipped.

pub mod config;
pub mod encoding;
pub mod error;
pub mod reference;
pub mod resolve;
pub mod value;

pub use config::{DEFAULT_CONFIG_DIR, EnvironmentConfig, config_path};
pub use encoding::{OutputEncoding, Rendered, WrittenFile, render, structured_file_name};
pub use error::ParamsError;
pub use reference::{Reference, ReferenceKind, ReferenceTable};
pub use resolve::{Resolution, ResolvedParameter, SkippedParameter, resolve_block, resolve_stack};
pub use value::ParameterValue;

use std::path::PathBuf;

/// Everything one `parse-parameters` invocation needs.
#[derive(Debug, Clone)]
pub struct ParameterRequest {
    pub environment: String,
    pub stack: String,
    pub config_dir: PathBuf,
    pub out_dir: PathBuf,
    pub encoding: OutputEncoding,
    pub secrets_json: String,
    pub variables_json: String,
}

#[derive(Debug, Clone)]
pub struct ParameterOutcome {
    pub rendered: Rendered,
    pub resolved: usize,
    pub skipped: Vec<SkippedParameter>,
}

/// Run a full resolution: mappings, configuration, stack, substitution, render.
///
/// Mappings are deserialized first so malformed input fails before any
/// configuration is read.
pub fn resolve_request(request: &ParameterRequest) -> Result<ParameterOutcome, ParamsError> {
    let table = ReferenceTable::from_json(&request.secrets_json, &request.variables_json)?;
    let config = EnvironmentConfig::load(&request.config_dir, &request.environment)?;
    let resolution = resolve_stack(&config, &request.stack, &table)?;
    let rendered = render(
        request.encoding,
        &resolution.parameters,
        &request.out_dir,
        &request.environment,
        &request.stack,
    )?;
    Ok(ParameterOutcome {
        rendered,
        resolved: resolution.parameters.len(),
        skipped: resolution.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn request(dir: &Path, encoding: OutputEncoding, secrets: &str) -> ParameterRequest {
        ParameterRequest {
            environment: "dev".to_string(),
            stack: "api".to_string(),
            config_dir: dir.to_path_buf(),
            out_dir: dir.to_path_buf(),
            encoding,
            secrets_json: secrets.to_string(),
            variables_json: String::new(),
        }
    }

    #[test]
    fn inline_request_matches_reference_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("dev.json"),
            r#"{"parameters": {"api": {"Key1": "SECRET.s1"}}}"#,
        )
        .expect("config written");

        let outcome = resolve_request(&request(
            dir.path(),
            OutputEncoding::Inline,
            r#"{"s1": "hello"}"#,
        ))
        .expect("resolves");
        assert_eq!(
            outcome.rendered,
            Rendered::Text(r#"ParameterKey="Key1",ParameterValue="hello""#.to_string())
        );
        assert_eq!(outcome.resolved, 1);
    }

    #[test]
    fn missing_stack_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("dev.json"),
            r#"{"parameters": {"web": {"Key1": "x"}}}"#,
        )
        .expect("config written");

        let err = resolve_request(&request(dir.path(), OutputEncoding::StructuredFile, ""))
            .unwrap_err();
        assert!(matches!(err, ParamsError::StackNotFound { .. }));
        assert!(!dir.path().join(structured_file_name("dev", "api")).exists());
    }

    #[test]
    fn malformed_mapping_fails_before_config_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_request(&request(dir.path(), OutputEncoding::Inline, "{oops"))
            .unwrap_err();
        assert!(matches!(err, ParamsError::MalformedMapping { .. }));
    }
}
