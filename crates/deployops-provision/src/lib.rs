//! Repository and account provisioning driven by a TOML description.
//!
//! The flow is: load [`ProvisionConfig`], fetch an [`ExportSet`] per
//! environment, gather [`ProvisionInputs`], build a [`RepoPlan`] per
//! repository, then hand plans to an [`Executor`] in dry-run or apply mode.
//! Provider access sits behind [`ExportRegistry`], [`SourceHost`], and
//! [`SecretsVault`]; the shipped adapters shell out to `aws` and `gh`.

pub mod account;
pub mod apply;
pub mod catalog;
mod command;
pub mod config;
pub mod error;
pub mod exports;
pub mod host;
pub mod plan;
pub mod secret;
pub mod vault;

pub use account::{
    AccountSecretPlan, AccountSecretRecord, apply_account_secrets, plan_account_secrets,
};
pub use apply::{ActionKind, ActionRecord, ActionStatus, Executor, Mode, Scope};
pub use config::{DEFAULT_CONFIG_PATH, EnvironmentConfig, ProvisionConfig, RepoConfig, RepoKind};
pub use error::ProvisionError;
pub use exports::{AwsCliExports, Export, ExportRegistry, ExportSet, FileExports};
pub use host::{GhCli, SourceHost};
pub use plan::{
    EnvironmentSpec, ProvisionInputs, RepoPlan, Reviewer, SecretAssignment, SecretTarget,
    plan_repo,
};
pub use secret::SecretValue;
pub use vault::{AwsCliVault, SecretsVault};
