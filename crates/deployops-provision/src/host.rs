//! Source-hosting seam: team lookup, repository secrets, environments.

use crate::command::ToolCall;
use crate::error::ProvisionError;
use crate::plan::{EnvironmentSpec, SecretTarget};
use crate::secret::SecretValue;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

pub trait SourceHost {
    fn team_id(&self, organization: &str, slug: &str) -> Result<u64, ProvisionError>;

    fn put_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretValue,
        target: SecretTarget,
    ) -> Result<(), ProvisionError>;

    /// Create or update `environment` with the given team reviewers.
    fn put_environment(
        &self,
        repo: &str,
        environment: &EnvironmentSpec,
        reviewer_team_ids: &[u64],
    ) -> Result<(), ProvisionError>;
}

/// `gh` CLI adapter. Secret encryption is left to `gh secret set`.
///
/// The token is exposed only when a `gh` process is spawned.
#[derive(Debug, Default)]
pub struct GhCli {
    token: Option<SecretString>,
}

impl GhCli {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(SecretString::from),
        }
    }

    fn call<'a>(&self, args: Vec<String>) -> ToolCall<'a> {
        let call = ToolCall::new("gh", args);
        match &self.token {
            Some(token) => call.env("GH_TOKEN", token.expose_secret()),
            None => call,
        }
    }
}

/// Request body for `PUT repos/{repo}/environments/{name}`.
pub fn environment_body(environment: &EnvironmentSpec, reviewer_team_ids: &[u64]) -> Value {
    let reviewers: Vec<Value> = reviewer_team_ids
        .iter()
        .map(|id| json!({"type": "Team", "id": id}))
        .collect();
    let branch_policy = if environment.protected_branches_only {
        json!({"protected_branches": true, "custom_branch_policies": false})
    } else {
        Value::Null
    };
    json!({
        "reviewers": reviewers,
        "deployment_branch_policy": branch_policy,
    })
}

impl SourceHost for GhCli {
    fn team_id(&self, organization: &str, slug: &str) -> Result<u64, ProvisionError> {
        let stdout = self
            .call(vec![
                "api".to_string(),
                format!("orgs/{organization}/teams/{slug}"),
                "--jq".to_string(),
                ".id".to_string(),
            ])
            .run()?;
        stdout.trim().parse().map_err(|_| ProvisionError::Parse {
            program: "gh",
            message: format!("team `{slug}` id is not a number: {}", stdout.trim()),
        })
    }

    fn put_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretValue,
        target: SecretTarget,
    ) -> Result<(), ProvisionError> {
        self.call(vec![
            "secret".to_string(),
            "set".to_string(),
            name.to_string(),
            "--repo".to_string(),
            repo.to_string(),
            "--app".to_string(),
            target.as_str().to_string(),
        ])
        .stdin(value.expose_secret().as_bytes())
        .run()?;
        Ok(())
    }

    fn put_environment(
        &self,
        repo: &str,
        environment: &EnvironmentSpec,
        reviewer_team_ids: &[u64],
    ) -> Result<(), ProvisionError> {
        let body = environment_body(environment, reviewer_team_ids).to_string();
        self.call(vec![
            "api".to_string(),
            "--method".to_string(),
            "PUT".to_string(),
            format!("repos/{repo}/environments/{}", environment.name),
            "--input".to_string(),
            "-".to_string(),
        ])
        .stdin(body.as_bytes())
        .run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Reviewer;

    #[test]
    fn protected_environments_restrict_branches() {
        let environment = EnvironmentSpec {
            name: "prod".to_string(),
            reviewers: vec![Reviewer::Administrators, Reviewer::Deployments],
            protected_branches_only: true,
        };
        assert_eq!(
            environment_body(&environment, &[11, 42]),
            json!({
                "reviewers": [{"type": "Team", "id": 11}, {"type": "Team", "id": 42}],
                "deployment_branch_policy": {
                    "protected_branches": true,
                    "custom_branch_policies": false
                }
            })
        );
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let host = GhCli::new(Some("ghp_supersecret".to_string()));
        let rendered = format!("{host:?}");
        assert!(!rendered.contains("ghp_supersecret"), "{rendered}");

        let call = host.call(vec!["api".to_string()]);
        assert_eq!(call.envs, vec![("GH_TOKEN", "ghp_supersecret".to_string())]);
    }

    #[test]
    fn anonymous_host_sets_no_token() {
        let call = GhCli::new(None).call(Vec::new());
        assert!(call.envs.is_empty());
    }

    #[test]
    fn open_environments_send_null_branch_policy() {
        let environment = EnvironmentSpec {
            name: "dev".to_string(),
            reviewers: Vec::new(),
            protected_branches_only: false,
        };
        let body = environment_body(&environment, &[]);
        assert_eq!(body["reviewers"], json!([]));
        assert!(body["deployment_branch_policy"].is_null());
    }
}
