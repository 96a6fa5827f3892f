//! TOML description of what gets provisioned where.

use crate::error::ProvisionError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_CONFIG_PATH: &str = "provision.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionConfig {
    pub organization: String,
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,
    /// Pause after every mutating call.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Environment whose exports carry the proxygen roles.
    pub proxygen_environment: String,
    /// Environment whose roles feed the repo-wide `DEV_*` secrets.
    #[serde(default = "default_development_environment")]
    pub development_environment: String,
    #[serde(default = "default_status_api_key_env")]
    pub status_api_key_env: String,
    pub teams: TeamSlugs,
    pub app_ids: AppIds,
    #[serde(default)]
    pub pem_files: PemFiles,
    pub environments: Vec<EnvironmentConfig>,
    pub repos: Vec<RepoConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamSlugs {
    pub administrators: String,
    pub developers: String,
    pub deployments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppIds {
    pub automerge: String,
    pub multi_repo_deployment: String,
}

/// File names under `secrets_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PemFiles {
    pub regression_tests: String,
    pub automerge: String,
    pub multi_repo_deployment: String,
}

impl Default for PemFiles {
    fn default() -> Self {
        Self {
            regression_tests: "regression_test_app.pem".to_string(),
            automerge: "automerge.pem".to_string(),
            multi_repo_deployment: "eps_multi_repo_deployment.pem".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub name: String,
    /// Cloud credentials profile used to list exports.
    pub profile: String,
    pub secret_prefix: String,
    /// Mirror this environment's secrets to Dependabot.
    #[serde(default)]
    pub dependabot: bool,
    #[serde(default)]
    pub artillery_runner: bool,
    #[serde(default)]
    pub spine_server: Option<String>,
    #[serde(default)]
    pub service_search_server: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoKind {
    Standard,
    AccountResources,
    Echo,
}

impl RepoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::AccountResources => "account-resources",
            Self::Echo => "echo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// `owner/name`.
    pub name: String,
    #[serde(default = "default_repo_kind")]
    pub kind: RepoKind,
    #[serde(default)]
    pub target_spine_servers: bool,
    #[serde(default)]
    pub target_service_search_servers: bool,
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from(".secrets")
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_development_environment() -> String {
    "dev".to_string()
}

fn default_status_api_key_env() -> String {
    "APIM_STATUS_API_KEY".to_string()
}

fn default_repo_kind() -> RepoKind {
    RepoKind::Standard
}

fn secret_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("secret prefix regex must compile"))
}

fn repo_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("repo name regex must compile")
    })
}

impl ProvisionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ProvisionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ProvisionError> {
        let config: Self = toml::from_str(text).map_err(|source| ProvisionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.organization.trim().is_empty() {
            return Err(invalid("organization must not be empty"));
        }
        if self.environments.is_empty() {
            return Err(invalid("at least one environment is required"));
        }

        let mut names = BTreeSet::new();
        let mut prefixes = BTreeSet::new();
        for environment in &self.environments {
            if environment.name.trim().is_empty() {
                return Err(invalid("environment names must not be empty"));
            }
            if !names.insert(environment.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate environment `{}`",
                    environment.name
                )));
            }
            if !secret_prefix_re().is_match(&environment.secret_prefix) {
                return Err(invalid(format!(
                    "environment `{}` has invalid secret_prefix `{}`",
                    environment.name, environment.secret_prefix
                )));
            }
            if !prefixes.insert(environment.secret_prefix.as_str()) {
                return Err(invalid(format!(
                    "duplicate secret_prefix `{}`",
                    environment.secret_prefix
                )));
            }
        }

        for (field, name) in [
            ("proxygen_environment", &self.proxygen_environment),
            ("development_environment", &self.development_environment),
        ] {
            if !names.contains(name.as_str()) {
                return Err(invalid(format!(
                    "{field} `{name}` is not a configured environment"
                )));
            }
        }

        if self.repos.is_empty() {
            return Err(invalid("at least one repo is required"));
        }
        let mut repos = BTreeSet::new();
        for repo in &self.repos {
            if !repo_name_re().is_match(&repo.name) {
                return Err(invalid(format!(
                    "repo `{}` must be written as owner/name",
                    repo.name
                )));
            }
            if !repos.insert(repo.name.as_str()) {
                return Err(invalid(format!("duplicate repo `{}`", repo.name)));
            }
        }
        Ok(())
    }

    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, ProvisionError> {
        self.environments
            .iter()
            .find(|environment| environment.name == name)
            .ok_or_else(|| ProvisionError::UnknownEnvironment(name.to_string()))
    }

    pub fn pem_path(&self, file_name: &str) -> PathBuf {
        self.secrets_dir.join(file_name)
    }
}

fn invalid(message: impl Into<String>) -> ProvisionError {
    ProvisionError::InvalidConfig(message.into())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
organization = "example-org"
proxygen_environment = "prod"

[teams]
administrators = "admins"
developers = "devs"
deployments = "deployers"

[app_ids]
automerge = "420347"
multi_repo_deployment = "2278388"

[[environments]]
name = "dev"
profile = "acct-dev"
secret_prefix = "DEV"
dependabot = true
artillery_runner = true
spine_server = "spine.dev.example"
service_search_server = "search.dev.example"

[[environments]]
name = "ref"
profile = "acct-ref"
secret_prefix = "REF"
artillery_runner = true
spine_server = "spine.ref.example"

[[environments]]
name = "prod"
profile = "acct-prod"
secret_prefix = "PROD"
spine_server = "spine.prod.example"
service_search_server = "search.example"

[[repos]]
name = "example-org/api"
target_spine_servers = true

[[repos]]
name = "example-org/account-resources"
kind = "account-resources"

[[repos]]
name = "example-org/echo"
kind = "echo"
"#;

    pub(crate) fn sample() -> ProvisionConfig {
        ProvisionConfig::parse(SAMPLE, Path::new("provision.toml")).expect("sample parses")
    }

    #[test]
    fn sample_fills_defaults() {
        let config = sample();
        assert_eq!(config.secrets_dir, PathBuf::from(".secrets"));
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.development_environment, "dev");
        assert_eq!(config.status_api_key_env, "APIM_STATUS_API_KEY");
        assert_eq!(config.pem_files, PemFiles::default());
        assert_eq!(config.repos[0].kind, RepoKind::Standard);
        assert_eq!(config.repos[1].kind, RepoKind::AccountResources);
        assert_eq!(config.environment("ref").unwrap().profile, "acct-ref");
        assert!(matches!(
            config.environment("qa"),
            Err(ProvisionError::UnknownEnvironment(name)) if name == "qa"
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = SAMPLE.replace("proxygen_environment", "proxygen_env");
        assert!(matches!(
            ProvisionConfig::parse(&text, Path::new("p.toml")),
            Err(ProvisionError::ConfigParse { .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_prefixes_and_references() {
        let bad_prefix = SAMPLE.replace("secret_prefix = \"REF\"", "secret_prefix = \"ref\"");
        let err = ProvisionConfig::parse(&bad_prefix, Path::new("p.toml")).unwrap_err();
        assert!(err.to_string().contains("invalid secret_prefix `ref`"));

        let unknown_proxygen = SAMPLE.replace(
            "proxygen_environment = \"prod\"",
            "proxygen_environment = \"live\"",
        );
        let err = ProvisionConfig::parse(&unknown_proxygen, Path::new("p.toml")).unwrap_err();
        assert!(err.to_string().contains("proxygen_environment `live`"));

        let duplicate = SAMPLE.replace("name = \"ref\"", "name = \"dev\"");
        let err = ProvisionConfig::parse(&duplicate, Path::new("p.toml")).unwrap_err();
        assert!(err.to_string().contains("duplicate environment `dev`"));

        let bad_repo = SAMPLE.replace("example-org/echo", "echo");
        let err = ProvisionConfig::parse(&bad_repo, Path::new("p.toml")).unwrap_err();
        assert!(err.to_string().contains("owner/name"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("provision.toml");
        fs::write(&path, SAMPLE).expect("written");
        assert_eq!(ProvisionConfig::load(&path).expect("loads"), sample());
        assert!(matches!(
            ProvisionConfig::load(dir.path().join("missing.toml")),
            Err(ProvisionError::Read { .. })
        ));
    }
}
