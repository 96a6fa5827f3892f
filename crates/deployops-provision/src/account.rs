//! Account-level secrets written to the secrets vault of one environment.

use crate::apply::{ActionStatus, Mode};
use crate::catalog::{ACCOUNT_SECRETS, AccountSecret, SecretSource};
use crate::error::ProvisionError;
use crate::exports::ExportSet;
use crate::secret::{SecretValue, read_secret_file};
use crate::vault::SecretsVault;
use serde::Serialize;
use std::path::Path;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AccountSecretPlan {
    pub entry: AccountSecret,
    /// Vault identifier taken from the environment's exports.
    pub secret_arn: Option<String>,
    pub local_name: String,
    pub value: Option<SecretValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSecretRecord {
    pub name: String,
    pub secret_arn: Option<String>,
    pub source: String,
    pub value_present: bool,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Pair every catalog entry with its vault ARN and local value.
///
/// Missing required exports are fatal; missing local values are not.
pub fn plan_account_secrets(
    environment: &str,
    exports: &ExportSet,
    secrets_dir: &Path,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<AccountSecretPlan>, ProvisionError> {
    let mut plans = Vec::with_capacity(ACCOUNT_SECRETS.len());
    for entry in ACCOUNT_SECRETS {
        let secret_arn = exports.named(entry.export, entry.required)?;
        let local_name = entry.local_name(environment);
        let value = match entry.source {
            SecretSource::EnvVar => env_lookup(&local_name).map(SecretValue::from),
            SecretSource::File => read_secret_file(&secrets_dir.join(&local_name))?,
        };
        plans.push(AccountSecretPlan {
            entry: *entry,
            secret_arn,
            local_name,
            value,
        });
    }
    Ok(plans)
}

pub fn apply_account_secrets(
    plans: &[AccountSecretPlan],
    vault: &dyn SecretsVault,
    mode: Mode,
    delay: Duration,
) -> Result<Vec<AccountSecretRecord>, ProvisionError> {
    let mut records = Vec::with_capacity(plans.len());
    for plan in plans {
        let source = match plan.entry.source {
            SecretSource::EnvVar => format!("env:{}", plan.local_name),
            SecretSource::File => format!("file:{}", plan.local_name),
        };
        let mut record = AccountSecretRecord {
            name: plan.entry.logical.to_string(),
            secret_arn: plan.secret_arn.clone(),
            source,
            value_present: plan.value.is_some(),
            status: ActionStatus::Planned,
            note: None,
        };
        match (&plan.secret_arn, &plan.value, mode) {
            (None, _, _) => {
                record.status = ActionStatus::Skipped;
                record.note = Some("no export".to_string());
            }
            (Some(_), None, _) => {
                tracing::info!(secret = plan.entry.logical, "secret value is not set");
                record.status = ActionStatus::Skipped;
                record.note = Some("not set".to_string());
            }
            (Some(_), Some(_), Mode::DryRun) => {}
            (Some(arn), Some(value), Mode::Apply) => {
                tracing::info!(secret = plan.entry.logical, "putting secret value");
                vault.put_secret_value(arn, value)?;
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                record.status = ActionStatus::Applied;
            }
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::Export;
    use secrecy::ExposeSecret;
    use std::cell::RefCell;
    use std::fs;

    #[derive(Default)]
    struct RecordingVault {
        puts: RefCell<Vec<(String, String)>>,
    }

    impl SecretsVault for RecordingVault {
        fn put_secret_value(
            &self,
            secret_id: &str,
            value: &SecretValue,
        ) -> Result<(), ProvisionError> {
            self.puts
                .borrow_mut()
                .push((secret_id.to_string(), value.expose_secret().to_string()));
            Ok(())
        }
    }

    fn all_exports() -> ExportSet {
        ExportSet::new(
            ACCOUNT_SECRETS
                .iter()
                .map(|entry| Export::new(entry.export, format!("arn:{}", entry.logical)))
                .collect(),
        )
    }

    #[test]
    fn values_come_from_variables_and_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("dev_spine_ca_chain"), "chain").expect("written");

        let plans = plan_account_secrets("dev", &all_exports(), dir.path(), |name| {
            (name == "dev_jira_token").then(|| "jira".to_string())
        })
        .expect("plans");
        assert_eq!(plans.len(), ACCOUNT_SECRETS.len());

        let vault = RecordingVault::default();
        let records =
            apply_account_secrets(&plans, &vault, Mode::Apply, Duration::ZERO).expect("applies");
        assert_eq!(
            *vault.puts.borrow(),
            vec![
                ("arn:jira_token".to_string(), "jira".to_string()),
                ("arn:spine_ca_chain".to_string(), "chain".to_string()),
            ]
        );
        let applied = records
            .iter()
            .filter(|record| record.status == ActionStatus::Applied)
            .count();
        assert_eq!(applied, 2);
        assert_eq!(records[0].source, "env:dev_slack_webhook_url");
        assert_eq!(records[0].note.as_deref(), Some("not set"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plans = plan_account_secrets("qa", &all_exports(), dir.path(), |_| {
            Some("value".to_string())
        })
        .expect("plans");
        let vault = RecordingVault::default();
        let records =
            apply_account_secrets(&plans, &vault, Mode::DryRun, Duration::ZERO).expect("runs");
        assert!(vault.puts.borrow().is_empty());
        assert!(
            records
                .iter()
                .any(|record| record.status == ActionStatus::Planned)
        );
    }

    #[test]
    fn optional_exports_may_be_missing() {
        let mut exports: Vec<Export> = ACCOUNT_SECRETS
            .iter()
            .filter(|entry| entry.required)
            .map(|entry| Export::new(entry.export, "arn"))
            .collect();
        let dir = tempfile::tempdir().expect("tempdir");
        let plans =
            plan_account_secrets("dev", &ExportSet::new(exports.clone()), dir.path(), |_| None)
                .expect("plans");
        let optional = plans
            .iter()
            .find(|plan| !plan.entry.required)
            .expect("optional entry");
        assert_eq!(optional.secret_arn, None);

        exports.remove(0);
        let err = plan_account_secrets("dev", &ExportSet::new(exports), dir.path(), |_| None)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::MissingExport(name) if name == "account-resources:SlackWebHookUrl"
        ));
    }
}
