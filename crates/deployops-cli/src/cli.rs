use clap::{Parser, Subcommand, ValueEnum};
use deployops_params::{DEFAULT_CONFIG_DIR, OutputEncoding};
use deployops_policy::{DEFAULT_MAX_POLICY_LENGTH, DEFAULT_TEMPLATE_PATH};
use deployops_provision::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(
    name = "deployops",
    about = "Deployops: stack parameters, template checks, and repository provisioning",
    version
)]
pub struct Cli {
    /// Log filter for diagnostics on stderr (e.g. `info`, `deployops_params=debug`)
    #[arg(long, global = true, env = "DEPLOYOPS_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a stack's parameters for one environment
    ParseParameters {
        /// Environment name; selects `<config-dir>/<ENV>.json`
        env: String,

        /// Stack name under `parameters` in the environment file
        stack: String,

        /// JSON object of secret values
        #[arg(long, env = "PARAMS_SECRETS", default_value = "", hide_env_values = true)]
        secrets: String,

        /// JSON object of variable values
        #[arg(long, env = "PARAMS_VARIABLES", default_value = "")]
        variables: String,

        /// Output encoding
        #[arg(long, env = "PARAMS_OUTPUT", value_enum, default_value_t = OutputArg::Inline)]
        output: OutputArg,

        /// Directory holding per-environment parameter files
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: String,

        /// Directory for structured-file output
        #[arg(long, default_value = ".")]
        out_dir: String,
    },

    /// Check IAM policy documents in a template against a length limit
    CheckPolicyLength {
        /// Template file (YAML or JSON)
        #[arg(long, default_value = DEFAULT_TEMPLATE_PATH)]
        template: String,

        /// Logical resource id to measure (repeatable; default: every policy document)
        #[arg(long = "resource")]
        resources: Vec<String>,

        /// Maximum compact JSON length
        #[arg(long, default_value_t = DEFAULT_MAX_POLICY_LENGTH)]
        max_length: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flag resources a change set would replace or remove
    CheckReplacements {
        /// Change-set description JSON file
        change_set: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Provision repository secrets and deployment environments
    ProvisionRepos {
        /// Provisioning config (TOML)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        /// Token handed to `gh`; falls back to the ambient `gh` login
        #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
        gh_token: Option<String>,

        /// Read exports from `<DIR>/<environment>.json` instead of calling `aws`
        #[arg(long)]
        exports_dir: Option<String>,

        /// Only provision this repo (repeatable)
        #[arg(long = "repo")]
        repos: Vec<String>,

        /// Perform the changes; without this flag only the plan is printed
        #[arg(long)]
        apply: bool,

        /// Leave repository secrets untouched
        #[arg(long)]
        skip_secrets: bool,

        /// Leave deployment environments untouched
        #[arg(long)]
        skip_environments: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write account-level secrets to one environment's secrets vault
    ProvisionAccountSecrets {
        /// Provisioning config (TOML)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        /// Environment name from the config
        #[arg(long)]
        environment: String,

        /// Read exports from this file instead of calling `aws`
        #[arg(long)]
        exports_file: Option<String>,

        /// Perform the writes; without this flag only the plan is printed
        #[arg(long)]
        apply: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputArg {
    #[value(name = "structured-file")]
    StructuredFile,
    #[value(name = "inline")]
    Inline,
    #[value(name = "shell-assignment")]
    ShellAssignment,
}

impl From<OutputArg> for OutputEncoding {
    fn from(value: OutputArg) -> Self {
        match value {
            OutputArg::StructuredFile => Self::StructuredFile,
            OutputArg::Inline => Self::Inline,
            OutputArg::ShellAssignment => Self::ShellAssignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_match_the_library_encodings() {
        for arg in OutputArg::value_variants() {
            let name = arg
                .to_possible_value()
                .map(|value| value.get_name().to_string());
            assert_eq!(name.as_deref(), Some(OutputEncoding::from(*arg).as_str()));
        }
    }
}
