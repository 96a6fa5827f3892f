//! Output encodings for resolved parameters.

use crate::error::ParamsError;
use crate::resolve::ResolvedParameter;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// JSON array of records written to `<env>-<stack>-params.json`.
    StructuredFile,
    /// `ParameterKey="k",ParameterValue="v"` fragments, space separated.
    Inline,
    /// `k="v"` lines.
    ShellAssignment,
}

impl OutputEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructuredFile => "structured-file",
            Self::Inline => "inline",
            Self::ShellAssignment => "shell-assignment",
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a render produced: either the text itself or the file holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    File(WrittenFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub sha256: String,
    pub records: usize,
}

/// Render `parameters` in `encoding`.
///
/// Only [`OutputEncoding::StructuredFile`] touches the filesystem; it writes
/// into `out_dir`, replacing any previous file of the same name.
pub fn render(
    encoding: OutputEncoding,
    parameters: &[ResolvedParameter],
    out_dir: impl AsRef<Path>,
    environment: &str,
    stack: &str,
) -> Result<Rendered, ParamsError> {
    match encoding {
        OutputEncoding::Inline => render_inline(parameters).map(Rendered::Text),
        OutputEncoding::ShellAssignment => render_shell(parameters).map(Rendered::Text),
        OutputEncoding::StructuredFile => {
            write_structured_file(out_dir, environment, stack, parameters).map(Rendered::File)
        }
    }
}

pub fn render_inline(parameters: &[ResolvedParameter]) -> Result<String, ParamsError> {
    let mut fragments = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        if parameter.value.contains('"') {
            return Err(unsafe_value(
                parameter,
                OutputEncoding::Inline,
                "value contains a double quote",
            ));
        }
        if parameter.value.contains(['\n', '\r']) {
            return Err(unsafe_value(
                parameter,
                OutputEncoding::Inline,
                "value contains a line break",
            ));
        }
        if parameter
            .key
            .contains(|c: char| matches!(c, '"' | ',') || c.is_whitespace() || c.is_control())
        {
            return Err(unsafe_value(
                parameter,
                OutputEncoding::Inline,
                "key contains a quote, comma, whitespace, or control character",
            ));
        }
        fragments.push(format!(
            "ParameterKey=\"{}\",ParameterValue=\"{}\"",
            parameter.key, parameter.value
        ));
    }
    Ok(fragments.join(" "))
}

pub fn render_shell(parameters: &[ResolvedParameter]) -> Result<String, ParamsError> {
    let mut lines = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        if !shell_identifier_re().is_match(&parameter.key) {
            return Err(unsafe_value(
                parameter,
                OutputEncoding::ShellAssignment,
                "key is not a shell identifier",
            ));
        }
        lines.push(format!(
            "{}=\"{}\"",
            parameter.key,
            escape_double_quoted(&parameter.value)
        ));
    }
    Ok(lines.join("\n"))
}

/// Pretty JSON array of records, newline terminated.
pub fn render_structured(parameters: &[ResolvedParameter]) -> Result<String, ParamsError> {
    let mut body = serde_json::to_string_pretty(parameters).map_err(ParamsError::Serialize)?;
    body.push('\n');
    Ok(body)
}

pub fn structured_file_name(environment: &str, stack: &str) -> String {
    format!("{environment}-{stack}-params.json")
}

pub fn write_structured_file(
    out_dir: impl AsRef<Path>,
    environment: &str,
    stack: &str,
    parameters: &[ResolvedParameter],
) -> Result<WrittenFile, ParamsError> {
    let path = out_dir
        .as_ref()
        .join(structured_file_name(environment, stack));
    let body = render_structured(parameters)?;
    fs::write(&path, body.as_bytes()).map_err(|source| ParamsError::Write {
        path: path.clone(),
        source,
    })?;
    let sha256 = format!("{:x}", Sha256::digest(body.as_bytes()));
    tracing::debug!(path = %path.display(), %sha256, "wrote structured parameter file");
    Ok(WrittenFile {
        path,
        sha256,
        records: parameters.len(),
    })
}

fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn shell_identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("shell identifier regex must compile")
    })
}

fn unsafe_value(
    parameter: &ResolvedParameter,
    encoding: OutputEncoding,
    reason: &'static str,
) -> ParamsError {
    ParamsError::UnsafeValue {
        key: parameter.key.clone(),
        encoding,
        reason,
    }
}
