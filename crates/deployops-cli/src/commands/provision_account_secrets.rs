use crate::support::{
    fetch_exports_or_exit, load_provision_config_or_exit, print_json_or_exit, process_env,
};
use deployops_provision::{
    ActionStatus, AwsCliVault, Mode, apply_account_secrets, plan_account_secrets,
};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

pub fn run(
    config_path: String,
    environment_name: String,
    exports_file: Option<String>,
    apply: bool,
    json_output: bool,
) {
    let config = load_provision_config_or_exit(&config_path);
    let environment = config.environment(&environment_name).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    let exports = fetch_exports_or_exit(environment, exports_file.as_deref().map(Path::new));
    let plans = plan_account_secrets(
        &environment.name,
        &exports,
        &config.secrets_dir,
        process_env,
    )
    .unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    let mode = if apply { Mode::Apply } else { Mode::DryRun };
    let vault = AwsCliVault::new(&environment.profile);
    let records = apply_account_secrets(
        &plans,
        &vault,
        mode,
        Duration::from_millis(config.delay_ms),
    )
    .unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    if json_output {
        let payload = json!({
            "schema": 1,
            "mode": mode,
            "environment": environment.name,
            "secrets": records,
        });
        print_json_or_exit(&payload, "provision-account-secrets");
        return;
    }

    for record in &records {
        let arn = record.secret_arn.as_deref().unwrap_or("-");
        let value = if record.value_present {
            "value present"
        } else {
            "no value"
        };
        let note = record
            .note
            .as_deref()
            .map(|note| format!(" ({note})"))
            .unwrap_or_default();
        println!(
            "{:<8} {} -> {arn} [{}, {value}]{note}",
            record.status.as_str(),
            record.name,
            record.source
        );
    }
    let applied = records
        .iter()
        .filter(|record| record.status == ActionStatus::Applied)
        .count();
    println!(
        "[provision-account-secrets] {} (environment={}, secrets={}, applied={applied})",
        if apply { "APPLIED" } else { "DRY-RUN" },
        environment.name,
        records.len()
    );
}
