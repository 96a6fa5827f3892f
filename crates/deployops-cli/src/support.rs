use deployops_provision::{
    AwsCliExports, EnvironmentConfig, ExportRegistry, ExportSet, FileExports, ProvisionConfig,
};
use serde::Serialize;
use std::path::Path;

pub fn print_json_or_exit<T: Serialize>(payload: &T, label: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {label} payload: {err}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

pub fn load_provision_config_or_exit(path: &str) -> ProvisionConfig {
    ProvisionConfig::load(path).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    })
}

/// Exports for `environment`, from `aws` or from a captured JSON file.
pub fn fetch_exports_or_exit(environment: &EnvironmentConfig, file: Option<&Path>) -> ExportSet {
    let registry: Box<dyn ExportRegistry> = match file {
        Some(path) => Box::new(FileExports::new(path)),
        None => Box::new(AwsCliExports::new(&environment.profile)),
    };
    ExportSet::fetch(registry.as_ref()).unwrap_or_else(|err| {
        eprintln!(
            "error: failed to load exports for `{}` from {}: {err}",
            environment.name,
            registry.describe()
        );
        std::process::exit(1);
    })
}

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
