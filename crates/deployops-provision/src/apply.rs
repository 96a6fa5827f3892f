//! Executes repository plans against a [`SourceHost`].

use crate::config::TeamSlugs;
use crate::error::ProvisionError;
use crate::host::SourceHost;
use crate::plan::{EnvironmentSpec, RepoPlan, Reviewer, SecretAssignment};
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    DryRun,
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Secret,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionStatus {
    Planned,
    Applied,
    Skipped,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
        }
    }
}

/// One line of provisioning output. Never carries secret values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub repo: String,
    pub kind: ActionKind,
    pub target: String,
    pub detail: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Which halves of a plan to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub secrets: bool,
    pub environments: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            secrets: true,
            environments: true,
        }
    }
}

pub struct Executor<'h> {
    host: &'h dyn SourceHost,
    mode: Mode,
    delay: Duration,
    scope: Scope,
    organization: String,
    teams: TeamSlugs,
    team_ids: BTreeMap<Reviewer, u64>,
}

impl<'h> Executor<'h> {
    pub fn new(
        host: &'h dyn SourceHost,
        mode: Mode,
        delay: Duration,
        organization: impl Into<String>,
        teams: TeamSlugs,
    ) -> Self {
        Self {
            host,
            mode,
            delay,
            scope: Scope::default(),
            organization: organization.into(),
            teams,
            team_ids: BTreeMap::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn execute(&mut self, plan: &RepoPlan) -> Result<Vec<ActionRecord>, ProvisionError> {
        let mut records = Vec::new();
        if self.scope.secrets {
            tracing::info!(repo = plan.repo.as_str(), "setting secrets");
            for secret in &plan.secrets {
                self.execute_secret(&plan.repo, secret, &mut records)?;
            }
        }
        if self.scope.environments {
            tracing::info!(repo = plan.repo.as_str(), "setting environments");
            for environment in &plan.environments {
                records.push(self.execute_environment(&plan.repo, environment)?);
            }
        }
        Ok(records)
    }

    fn execute_secret(
        &mut self,
        repo: &str,
        secret: &SecretAssignment,
        records: &mut Vec<ActionRecord>,
    ) -> Result<(), ProvisionError> {
        for &target in secret.targets() {
            let mut record = ActionRecord {
                repo: repo.to_string(),
                kind: ActionKind::Secret,
                target: secret.name.clone(),
                detail: target.as_str().to_string(),
                status: ActionStatus::Planned,
                note: None,
            };
            match (&secret.value, self.mode) {
                (None, _) => {
                    tracing::info!(repo, secret = secret.name.as_str(), "secret value is not set");
                    record.status = ActionStatus::Skipped;
                    record.note = Some("not set".to_string());
                }
                (Some(_), Mode::DryRun) => {}
                (Some(value), Mode::Apply) => {
                    tracing::info!(
                        repo,
                        secret = secret.name.as_str(),
                        target = target.as_str(),
                        "setting secret"
                    );
                    self.host.put_secret(repo, &secret.name, value, target)?;
                    self.pause();
                    record.status = ActionStatus::Applied;
                }
            }
            records.push(record);
        }
        Ok(())
    }

    fn execute_environment(
        &mut self,
        repo: &str,
        environment: &EnvironmentSpec,
    ) -> Result<ActionRecord, ProvisionError> {
        let mut record = ActionRecord {
            repo: repo.to_string(),
            kind: ActionKind::Environment,
            target: environment.name.clone(),
            detail: describe_environment(environment),
            status: ActionStatus::Planned,
            note: None,
        };
        if self.mode == Mode::Apply {
            let mut reviewer_ids = Vec::with_capacity(environment.reviewers.len());
            for reviewer in &environment.reviewers {
                reviewer_ids.push(self.team_id(*reviewer)?);
            }
            tracing::info!(
                repo,
                environment = environment.name.as_str(),
                "creating environment"
            );
            self.host.put_environment(repo, environment, &reviewer_ids)?;
            self.pause();
            record.status = ActionStatus::Applied;
        }
        Ok(record)
    }

    fn team_id(&mut self, reviewer: Reviewer) -> Result<u64, ProvisionError> {
        if let Some(id) = self.team_ids.get(&reviewer) {
            return Ok(*id);
        }
        let slug = match reviewer {
            Reviewer::Administrators => &self.teams.administrators,
            Reviewer::Developers => &self.teams.developers,
            Reviewer::Deployments => &self.teams.deployments,
        };
        let id = self.host.team_id(&self.organization, slug)?;
        tracing::debug!(team = slug.as_str(), id, "resolved team id");
        self.team_ids.insert(reviewer, id);
        Ok(id)
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

fn describe_environment(environment: &EnvironmentSpec) -> String {
    let reviewers = if environment.reviewers.is_empty() {
        "none".to_string()
    } else {
        environment
            .reviewers
            .iter()
            .map(|reviewer| reviewer.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    if environment.protected_branches_only {
        format!("reviewers={reviewers} branches=protected")
    } else {
        format!("reviewers={reviewers}")
    }
}
