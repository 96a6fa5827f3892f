//! Per-repository provisioning plans.
//!
//! A plan is an ordered list of secret assignments followed by the
//! deployment environments the repository needs. Building a plan never
//! touches the hosting service.

use crate::catalog::{
    ARTILLERY_RUNNER_ROLE, DEV_CONTAINER_PUSH_IMAGE_ROLE, PROXYGEN_PROD_ROLE_EXPORT,
    PROXYGEN_PTL_ROLE_EXPORT, RELEASE_NOTES_EXECUTE_LAMBDA_ROLE, ROLE_SECRETS, Roles,
    resolve_roles,
};
use crate::config::{ProvisionConfig, RepoConfig, RepoKind};
use crate::error::ProvisionError;
use crate::exports::ExportSet;
use crate::secret::{SecretValue, read_secret_file};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const ACCOUNT_RESOURCES_SUFFIXES: [&str; 3] = ["ci", "account", "lambda"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretTarget {
    Actions,
    Dependabot,
}

impl SecretTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Dependabot => "dependabot",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecretAssignment {
    pub name: String,
    /// `None` keeps the secret in the plan as "not set".
    pub value: Option<SecretValue>,
    pub dependabot: bool,
}

impl SecretAssignment {
    pub fn targets(&self) -> &'static [SecretTarget] {
        if self.dependabot {
            &[SecretTarget::Actions, SecretTarget::Dependabot]
        } else {
            &[SecretTarget::Actions]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reviewer {
    Administrators,
    Developers,
    Deployments,
}

impl Reviewer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrators => "administrators",
            Self::Developers => "developers",
            Self::Deployments => "deployments",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    pub name: String,
    pub reviewers: Vec<Reviewer>,
    /// Deployments only from protected branches.
    pub protected_branches_only: bool,
}

impl EnvironmentSpec {
    fn new(name: &str, reviewers: &[Reviewer], protected_branches_only: bool) -> Self {
        Self {
            name: name.to_string(),
            reviewers: reviewers.to_vec(),
            protected_branches_only,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepoPlan {
    pub repo: String,
    pub kind: RepoKind,
    pub secrets: Vec<SecretAssignment>,
    pub environments: Vec<EnvironmentSpec>,
}

/// Values of one environment after its exports are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInputs {
    pub name: String,
    pub secret_prefix: String,
    pub dependabot: bool,
    pub artillery_runner: bool,
    pub spine_server: Option<String>,
    pub service_search_server: Option<String>,
    pub roles: Roles,
}

/// Everything a repository plan draws values from.
#[derive(Debug, Clone)]
pub struct ProvisionInputs {
    pub automerge_pem: Option<SecretValue>,
    pub automerge_app_id: String,
    pub regression_tests_pem: Option<SecretValue>,
    pub multi_repo_deployment_pem: Option<SecretValue>,
    pub multi_repo_deployment_app_id: String,
    pub status_api_key: Option<SecretValue>,
    pub proxygen_ptl_role: String,
    pub proxygen_prod_role: String,
    pub development_environment: String,
    pub environments: Vec<EnvironmentInputs>,
}

impl ProvisionInputs {
    /// Resolve roles and local files for every configured environment.
    ///
    /// `exports` is keyed by environment name; `env_lookup` reads process
    /// environment variables.
    pub fn gather(
        config: &ProvisionConfig,
        exports: &BTreeMap<String, ExportSet>,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProvisionError> {
        let exports_for = |name: &str| {
            exports
                .get(name)
                .ok_or_else(|| ProvisionError::MissingExportSet(name.to_string()))
        };

        let mut environments = Vec::with_capacity(config.environments.len());
        for environment in &config.environments {
            let roles = resolve_roles(exports_for(&environment.name)?)?;
            environments.push(EnvironmentInputs {
                name: environment.name.clone(),
                secret_prefix: environment.secret_prefix.clone(),
                dependabot: environment.dependabot,
                artillery_runner: environment.artillery_runner,
                spine_server: environment.spine_server.clone(),
                service_search_server: environment.service_search_server.clone(),
                roles,
            });
        }

        let proxygen = exports_for(&config.proxygen_environment)?;
        let proxygen_ptl_role = proxygen
            .named(PROXYGEN_PTL_ROLE_EXPORT, true)?
            .unwrap_or_default();
        let proxygen_prod_role = proxygen
            .named(PROXYGEN_PROD_ROLE_EXPORT, true)?
            .unwrap_or_default();

        let status_api_key = env_lookup(&config.status_api_key_env).map(SecretValue::from);
        if status_api_key.is_none() {
            tracing::warn!(
                variable = config.status_api_key_env.as_str(),
                "status API key variable is not set"
            );
        }

        Ok(Self {
            automerge_pem: read_secret_file(&config.pem_path(&config.pem_files.automerge))?,
            automerge_app_id: config.app_ids.automerge.clone(),
            regression_tests_pem: read_secret_file(
                &config.pem_path(&config.pem_files.regression_tests),
            )?,
            multi_repo_deployment_pem: read_secret_file(
                &config.pem_path(&config.pem_files.multi_repo_deployment),
            )?,
            multi_repo_deployment_app_id: config.app_ids.multi_repo_deployment.clone(),
            status_api_key,
            proxygen_ptl_role,
            proxygen_prod_role,
            development_environment: config.development_environment.clone(),
            environments,
        })
    }

    fn development(&self) -> Result<&EnvironmentInputs, ProvisionError> {
        self.environments
            .iter()
            .find(|environment| environment.name == self.development_environment)
            .ok_or_else(|| ProvisionError::UnknownEnvironment(self.development_environment.clone()))
    }
}

fn secret_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("secret name regex must compile"))
}

/// Repository secret names: upper-case identifiers outside the reserved
/// `GITHUB_` namespace.
pub fn validate_secret_name(name: &str) -> Result<(), ProvisionError> {
    if secret_name_re().is_match(name) && !name.starts_with("GITHUB_") {
        Ok(())
    } else {
        Err(ProvisionError::InvalidSecretName(name.to_string()))
    }
}

#[derive(Default)]
struct SecretList {
    secrets: Vec<SecretAssignment>,
}

impl SecretList {
    fn push(&mut self, name: String, value: Option<SecretValue>, dependabot: bool) {
        self.secrets.push(SecretAssignment {
            name,
            value,
            dependabot,
        });
    }

    fn text(&mut self, name: String, value: Option<&str>, dependabot: bool) {
        self.push(name, value.map(SecretValue::from), dependabot);
    }
}

pub fn plan_repo(repo: &RepoConfig, inputs: &ProvisionInputs) -> Result<RepoPlan, ProvisionError> {
    let plan = RepoPlan {
        repo: repo.name.clone(),
        kind: repo.kind,
        secrets: plan_secrets(repo, inputs)?,
        environments: plan_environments(repo.kind),
    };
    for secret in &plan.secrets {
        validate_secret_name(&secret.name)?;
    }
    Ok(plan)
}

fn plan_secrets(
    repo: &RepoConfig,
    inputs: &ProvisionInputs,
) -> Result<Vec<SecretAssignment>, ProvisionError> {
    let mut list = SecretList::default();
    let development = inputs.development()?;
    let dev = &development.secret_prefix;

    list.push(
        "AUTOMERGE_PEM".to_string(),
        inputs.automerge_pem.clone(),
        true,
    );
    list.text(
        "AUTOMERGE_APP_ID".to_string(),
        Some(inputs.automerge_app_id.as_str()),
        true,
    );
    list.text(
        format!("{dev}_CLOUD_FORMATION_EXECUTE_LAMBDA_ROLE"),
        development.roles.get(RELEASE_NOTES_EXECUTE_LAMBDA_ROLE),
        false,
    );
    list.text(
        format!("{dev}_CONTAINER_PUSH_IMAGE_ROLE"),
        development.roles.get(DEV_CONTAINER_PUSH_IMAGE_ROLE),
        true,
    );
    if repo.kind == RepoKind::Echo {
        return Ok(list.secrets);
    }

    list.push(
        "REGRESSION_TESTS_PEM".to_string(),
        inputs.regression_tests_pem.clone(),
        true,
    );
    list.push(
        "APIM_STATUS_API_KEY".to_string(),
        inputs.status_api_key.clone(),
        true,
    );
    list.text(
        "PROXYGEN_PTL_ROLE".to_string(),
        Some(inputs.proxygen_ptl_role.as_str()),
        true,
    );
    list.text(
        "PROXYGEN_PROD_ROLE".to_string(),
        Some(inputs.proxygen_prod_role.as_str()),
        true,
    );

    for environment in inputs.environments.iter().filter(|env| env.artillery_runner) {
        list.text(
            format!("{}_ARTILLERY_RUNNER_ROLE", environment.secret_prefix),
            environment.roles.get(ARTILLERY_RUNNER_ROLE),
            environment.dependabot,
        );
    }

    for environment in &inputs.environments {
        for role_secret in ROLE_SECRETS {
            list.text(
                format!("{}_{}", environment.secret_prefix, role_secret.suffix),
                environment.roles.get(role_secret.role),
                environment.dependabot,
            );
        }
    }

    if repo.target_spine_servers {
        for environment in &inputs.environments {
            list.text(
                format!("{}_TARGET_SPINE_SERVER", environment.secret_prefix),
                environment.spine_server.as_deref(),
                environment.dependabot,
            );
        }
    }
    if repo.target_service_search_servers {
        for environment in &inputs.environments {
            list.text(
                format!("{}_TARGET_SERVICE_SEARCH_SERVER", environment.secret_prefix),
                environment.service_search_server.as_deref(),
                environment.dependabot,
            );
        }
    }

    if repo.kind == RepoKind::AccountResources {
        list.push(
            "EPS_MULTI_REPO_DEPLOYMENT_PEM".to_string(),
            inputs.multi_repo_deployment_pem.clone(),
            false,
        );
        list.text(
            "EPS_MULTI_REPO_DEPLOYMENT_APP_ID".to_string(),
            Some(inputs.multi_repo_deployment_app_id.as_str()),
            false,
        );
    }
    Ok(list.secrets)
}

pub fn plan_environments(kind: RepoKind) -> Vec<EnvironmentSpec> {
    use Reviewer::{Administrators, Deployments, Developers};

    let mut environments = vec![
        EnvironmentSpec::new("dev", &[], false),
        EnvironmentSpec::new("ref", &[Administrators, Developers], false),
        EnvironmentSpec::new("int", &[Administrators, Developers], true),
    ];
    match kind {
        RepoKind::Standard => environments.extend([
            EnvironmentSpec::new("dev-pr", &[], false),
            EnvironmentSpec::new("recovery", &[Administrators, Developers], false),
            EnvironmentSpec::new("qa", &[Administrators, Developers], true),
            EnvironmentSpec::new("prod", &[Administrators, Deployments], true),
        ]),
        RepoKind::AccountResources => {
            environments.extend([
                EnvironmentSpec::new("recovery", &[Administrators, Developers], false),
                EnvironmentSpec::new("qa", &[Administrators, Developers], true),
                EnvironmentSpec::new("prod", &[Administrators, Deployments], true),
            ]);
            return environments
                .into_iter()
                .flat_map(|environment| {
                    ACCOUNT_RESOURCES_SUFFIXES.map(|suffix| EnvironmentSpec {
                        name: format!("{}-{suffix}", environment.name),
                        ..environment.clone()
                    })
                })
                .collect();
        }
        RepoKind::Echo => environments.extend([
            EnvironmentSpec::new("veit", &[], false),
            EnvironmentSpec::new("dep", &[Administrators, Developers], true),
            EnvironmentSpec::new("live", &[Administrators], true),
        ]),
    }
    environments
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::ROLE_EXPORTS;
    use crate::config::tests::sample;
    use crate::exports::Export;
    use secrecy::ExposeSecret;

    pub(crate) fn exports_with_every_role(environment: &str) -> ExportSet {
        let mut exports: Vec<Export> = ROLE_EXPORTS
            .iter()
            .map(|entry| Export::new(entry.export, format!("arn:{environment}:{}", entry.role)))
            .collect();
        exports.push(Export::new(PROXYGEN_PTL_ROLE_EXPORT, "arn:proxygen-ptl"));
        exports.push(Export::new(PROXYGEN_PROD_ROLE_EXPORT, "arn:proxygen-prod"));
        ExportSet::new(exports)
    }

    pub(crate) fn sample_inputs() -> ProvisionInputs {
        let config = sample();
        let exports = config
            .environments
            .iter()
            .map(|env| (env.name.clone(), exports_with_every_role(&env.name)))
            .collect();
        let mut inputs = ProvisionInputs::gather(&config, &exports, |name| {
            (name == "APIM_STATUS_API_KEY").then(|| "status-key".to_string())
        })
        .expect("inputs gather");
        inputs.automerge_pem = Some(SecretValue::new("automerge-pem"));
        inputs
    }

    fn names(plan: &RepoPlan) -> Vec<&str> {
        plan.secrets.iter().map(|secret| secret.name.as_str()).collect()
    }

    #[test]
    fn echo_repos_get_only_the_automerge_and_dev_subset() {
        let config = sample();
        let plan = plan_repo(&config.repos[2], &sample_inputs()).expect("plans");
        assert_eq!(
            names(&plan),
            vec![
                "AUTOMERGE_PEM",
                "AUTOMERGE_APP_ID",
                "DEV_CLOUD_FORMATION_EXECUTE_LAMBDA_ROLE",
                "DEV_CONTAINER_PUSH_IMAGE_ROLE",
            ]
        );
        assert!(!plan.secrets[2].dependabot);
        assert!(plan.secrets[3].dependabot);
        let environments: Vec<&str> = plan.environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(environments, vec!["dev", "ref", "int", "veit", "dep", "live"]);
        assert_eq!(plan.environments[5].reviewers, vec![Reviewer::Administrators]);
    }

    #[test]
    fn standard_repos_get_role_secrets_for_every_environment() {
        let config = sample();
        let plan = plan_repo(&config.repos[0], &sample_inputs()).expect("plans");
        let names = names(&plan);

        assert_eq!(
            &names[4..8],
            &[
                "REGRESSION_TESTS_PEM",
                "APIM_STATUS_API_KEY",
                "PROXYGEN_PTL_ROLE",
                "PROXYGEN_PROD_ROLE",
            ]
        );
        assert_eq!(&names[8..10], &["DEV_ARTILLERY_RUNNER_ROLE", "REF_ARTILLERY_RUNNER_ROLE"]);
        for prefix in ["DEV", "REF", "PROD"] {
            for role_secret in ROLE_SECRETS {
                let name = format!("{prefix}_{}", role_secret.suffix);
                assert!(names.contains(&name.as_str()), "missing {name}");
            }
        }
        assert_eq!(
            &names[names.len() - 3..],
            &[
                "DEV_TARGET_SPINE_SERVER",
                "REF_TARGET_SPINE_SERVER",
                "PROD_TARGET_SPINE_SERVER",
            ]
        );
        assert!(!names.contains(&"EPS_MULTI_REPO_DEPLOYMENT_PEM"));

        let deploy = plan
            .secrets
            .iter()
            .find(|secret| secret.name == "REF_CLOUD_FORMATION_CREATE_CHANGESET_ROLE")
            .expect("planned");
        assert_eq!(
            deploy.value.as_ref().map(ExposeSecret::expose_secret),
            Some("arn:ref:cloud_formation_prepare_changeset_role")
        );
        assert!(!deploy.dependabot);
        assert_eq!(deploy.targets(), &[SecretTarget::Actions]);

        let environments: Vec<&str> = plan.environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            environments,
            vec!["dev", "ref", "int", "dev-pr", "recovery", "qa", "prod"]
        );
    }

    #[test]
    fn account_resources_repos_get_suffixed_environments() {
        let config = sample();
        let plan = plan_repo(&config.repos[1], &sample_inputs()).expect("plans");
        let names = names(&plan);
        assert_eq!(
            &names[names.len() - 2..],
            &["EPS_MULTI_REPO_DEPLOYMENT_PEM", "EPS_MULTI_REPO_DEPLOYMENT_APP_ID"]
        );

        let environments: Vec<&str> = plan.environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(environments.len(), 18);
        assert_eq!(
            &environments[..4],
            &["dev-ci", "dev-account", "dev-lambda", "ref-ci"]
        );
        let prod_lambda = plan.environments.last().expect("environments");
        assert_eq!(prod_lambda.name, "prod-lambda");
        assert_eq!(
            prod_lambda.reviewers,
            vec![Reviewer::Administrators, Reviewer::Deployments]
        );
        assert!(prod_lambda.protected_branches_only);
    }

    #[test]
    fn absent_values_stay_in_the_plan() {
        let config = sample();
        let mut inputs = sample_inputs();
        inputs.regression_tests_pem = None;
        let plan = plan_repo(&config.repos[0], &inputs).expect("plans");
        let pem = plan
            .secrets
            .iter()
            .find(|secret| secret.name == "REGRESSION_TESTS_PEM")
            .expect("planned");
        assert!(pem.value.is_none());
    }

    #[test]
    fn gather_requires_exports_for_every_environment() {
        let config = sample();
        let exports: BTreeMap<String, ExportSet> =
            [("dev".to_string(), exports_with_every_role("dev"))].into();
        let err = ProvisionInputs::gather(&config, &exports, |_| None).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingExportSet(name) if name == "ref"));
    }

    #[test]
    fn secret_names_are_validated() {
        assert!(validate_secret_name("DEV_CDK_PULL_IMAGE_ROLE").is_ok());
        assert!(validate_secret_name("_PRIVATE").is_ok());
        assert!(validate_secret_name("GITHUB_TOKEN").is_err());
        assert!(validate_secret_name("lower").is_err());
        assert!(validate_secret_name("1ABC").is_err());
        assert!(validate_secret_name("").is_err());
    }
}
