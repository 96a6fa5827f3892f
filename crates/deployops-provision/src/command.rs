//! Thin wrapper for provider CLIs (`aws`, `gh`).

use crate::error::ProvisionError;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

/// One invocation of an external tool.
pub(crate) struct ToolCall<'a> {
    pub program: &'static str,
    pub args: Vec<String>,
    pub stdin: Option<&'a [u8]>,
    pub envs: Vec<(&'static str, String)>,
}

impl<'a> ToolCall<'a> {
    pub fn new(program: &'static str, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            stdin: None,
            envs: Vec::new(),
        }
    }

    pub fn stdin(mut self, input: &'a [u8]) -> Self {
        self.stdin = Some(input);
        self
    }

    pub fn env(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.envs.push((key, value.into()));
        self
    }

    /// Run to completion and return stdout.
    ///
    /// Arguments are echoed in errors; secret material must travel on stdin.
    pub fn run(self) -> Result<String, ProvisionError> {
        let rendered_args = self.args.join(" ");
        let mut command = Command::new(self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        tracing::debug!(program = self.program, args = %rendered_args, "running tool");
        let mut child = command.spawn().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ProvisionError::ToolNotInstalled {
                    program: self.program,
                }
            } else {
                ProvisionError::CommandFailed {
                    program: self.program,
                    args: rendered_args.clone(),
                    message: err.to_string(),
                }
            }
        })?;

        // Feed stdin from its own thread so a tool that writes before it
        // finishes reading cannot block on a full stdout pipe.
        let (written, waited) = thread::scope(|scope| {
            let writer = match (self.stdin, child.stdin.take()) {
                (Some(input), Some(mut pipe)) => Some(scope.spawn(move || pipe.write_all(input))),
                _ => None,
            };
            let waited = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (written, waited)
        });

        let output = waited.map_err(|err| ProvisionError::CommandFailed {
            program: self.program,
            args: rendered_args.clone(),
            message: err.to_string(),
        })?;

        if output.status.success() {
            written.map_err(|err| ProvisionError::CommandFailed {
                program: self.program,
                args: rendered_args.clone(),
                message: format!("failed writing stdin: {err}"),
            })?;
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exit status {}", output.status.code().unwrap_or(1))
            } else {
                stderr
            };
            Err(ProvisionError::CommandFailed {
                program: self.program,
                args: rendered_args,
                message,
            })
        }
    }
}
