use crate::support::{
    fetch_exports_or_exit, load_provision_config_or_exit, print_json_or_exit, process_env,
};
use deployops_provision::{
    ActionKind, ActionRecord, ActionStatus, Executor, ExportSet, GhCli, Mode, ProvisionInputs,
    RepoConfig, Scope, plan_repo,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub struct Args {
    pub config: String,
    pub gh_token: Option<String>,
    pub exports_dir: Option<String>,
    pub repos: Vec<String>,
    pub apply: bool,
    pub skip_secrets: bool,
    pub skip_environments: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let config = load_provision_config_or_exit(&args.config);
    let selected = select_repos(&config.repos, &args.repos);

    let exports_dir = args.exports_dir.map(PathBuf::from);
    let mut exports: BTreeMap<String, ExportSet> = BTreeMap::new();
    for environment in &config.environments {
        let file = exports_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", environment.name)));
        let set = fetch_exports_or_exit(environment, file.as_deref());
        exports.insert(environment.name.clone(), set);
    }

    let inputs = ProvisionInputs::gather(&config, &exports, process_env).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    let mode = if args.apply { Mode::Apply } else { Mode::DryRun };
    let host = GhCli::new(args.gh_token);
    let mut executor = Executor::new(
        &host,
        mode,
        Duration::from_millis(config.delay_ms),
        config.organization.clone(),
        config.teams.clone(),
    )
    .with_scope(Scope {
        secrets: !args.skip_secrets,
        environments: !args.skip_environments,
    });

    let mut records: Vec<ActionRecord> = Vec::new();
    for repo in &selected {
        let outcome = plan_repo(repo, &inputs).and_then(|plan| executor.execute(&plan));
        match outcome {
            Ok(mut repo_records) => records.append(&mut repo_records),
            Err(err) => {
                if !args.json {
                    print_records(&records);
                }
                eprintln!("error: {}: {err}", repo.name);
                std::process::exit(1);
            }
        }
    }

    if args.json {
        let payload = json!({
            "schema": 1,
            "mode": mode,
            "repos": selected.iter().map(|repo| repo.name.as_str()).collect::<Vec<_>>(),
            "actions": records,
        });
        print_json_or_exit(&payload, "provision-repos");
        return;
    }

    print_records(&records);
    let count = |status: ActionStatus| records.iter().filter(|r| r.status == status).count();
    println!(
        "[provision-repos] {} (repos={}, planned={}, applied={}, skipped={})",
        if args.apply { "APPLIED" } else { "DRY-RUN" },
        selected.len(),
        count(ActionStatus::Planned),
        count(ActionStatus::Applied),
        count(ActionStatus::Skipped),
    );
    if !args.apply {
        println!("  re-run with --apply to make these changes");
    }
}

fn select_repos<'a>(repos: &'a [RepoConfig], names: &[String]) -> Vec<&'a RepoConfig> {
    if names.is_empty() {
        return repos.iter().collect();
    }
    names
        .iter()
        .map(|name| {
            repos
                .iter()
                .find(|repo| &repo.name == name)
                .unwrap_or_else(|| {
                    eprintln!("error: repo `{name}` is not in the provisioning config");
                    std::process::exit(1);
                })
        })
        .collect()
}

fn print_records(records: &[ActionRecord]) {
    for record in records {
        let kind = match record.kind {
            ActionKind::Secret => "secret",
            ActionKind::Environment => "environment",
        };
        let note = record
            .note
            .as_deref()
            .map(|note| format!(" ({note})"))
            .unwrap_or_default();
        println!(
            "{:<8} {} {kind} {} [{}]{note}",
            record.status.as_str(),
            record.repo,
            record.target,
            record.detail
        );
    }
}
