//! Deployops CLI: the `deployops` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::ParseParameters {
            env,
            stack,
            secrets,
            variables,
            output,
            config_dir,
            out_dir,
        } => commands::parse_parameters::run(commands::parse_parameters::Args {
            environment: env,
            stack,
            secrets,
            variables,
            output: output.into(),
            config_dir,
            out_dir,
        }),

        Commands::CheckPolicyLength {
            template,
            resources,
            max_length,
            json,
        } => commands::check_policy_length::run(template, resources, max_length, json),

        Commands::CheckReplacements { change_set, json } => {
            commands::check_replacements::run(change_set, json)
        }

        Commands::ProvisionRepos {
            config,
            gh_token,
            exports_dir,
            repos,
            apply,
            skip_secrets,
            skip_environments,
            json,
        } => commands::provision_repos::run(commands::provision_repos::Args {
            config,
            gh_token,
            exports_dir,
            repos,
            apply,
            skip_secrets,
            skip_environments,
            json,
        }),

        Commands::ProvisionAccountSecrets {
            config,
            environment,
            exports_file,
            apply,
            json,
        } => commands::provision_account_secrets::run(
            config,
            environment,
            exports_file,
            apply,
            json,
        ),
    }
}
