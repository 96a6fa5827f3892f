//! Static catalogs of the exports and secrets every environment carries.
//!
//! Adding a role or an account secret is a one-line table change; nothing
//! downstream names individual entries except the few roles the repository
//! plan places outside the per-environment block.

use crate::error::ProvisionError;
use crate::exports::ExportSet;
use std::collections::BTreeMap;

pub const DEPLOY_ROLE: &str = "cloud_formation_deploy_role";
pub const CHECK_VERSION_ROLE: &str = "cloud_formation_check_version_role";
pub const PREPARE_CHANGESET_ROLE: &str = "cloud_formation_prepare_changeset_role";
pub const CDK_PULL_IMAGE_ROLE: &str = "CDK_pull_image_role";
pub const CDK_PUSH_IMAGE_ROLE: &str = "CDK_push_image_role";
pub const RELEASE_NOTES_EXECUTE_LAMBDA_ROLE: &str = "release_notes_execute_lambda_role";
pub const ARTILLERY_RUNNER_ROLE: &str = "artillery_runner_role";
pub const DEV_CONTAINER_PUSH_IMAGE_ROLE: &str = "dev_container_push_image_role";

pub const PROXYGEN_PTL_ROLE_EXPORT: &str = "ci-resources:ProxygenPTLRole";
pub const PROXYGEN_PROD_ROLE_EXPORT: &str = "ci-resources:ProxygenProdRole";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleExport {
    pub role: &'static str,
    pub export: &'static str,
    pub required: bool,
}

pub const ROLE_EXPORTS: &[RoleExport] = &[
    RoleExport {
        role: DEPLOY_ROLE,
        export: "ci-resources:CloudFormationDeployRole",
        required: true,
    },
    RoleExport {
        role: CHECK_VERSION_ROLE,
        export: "ci-resources:CloudFormationCheckVersionRole",
        required: true,
    },
    RoleExport {
        role: PREPARE_CHANGESET_ROLE,
        export: "ci-resources:CloudFormationPrepareChangesetRole",
        required: true,
    },
    RoleExport {
        role: CDK_PULL_IMAGE_ROLE,
        export: "ci-resources:CDKPullImageRole",
        required: true,
    },
    RoleExport {
        role: CDK_PUSH_IMAGE_ROLE,
        export: "ci-resources:CDKPushImageRole",
        required: true,
    },
    RoleExport {
        role: RELEASE_NOTES_EXECUTE_LAMBDA_ROLE,
        export: "ci-resources:ReleaseNotesExecuteLambdaRole",
        required: false,
    },
    RoleExport {
        role: ARTILLERY_RUNNER_ROLE,
        export: "ci-resources:ArtilleryRunnerRole",
        required: false,
    },
    RoleExport {
        role: DEV_CONTAINER_PUSH_IMAGE_ROLE,
        export: "ci-resources:DevContainerPushImageRole",
        required: false,
    },
];

/// Repository secret `<PREFIX>_<suffix>` carrying `role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSecret {
    pub suffix: &'static str,
    pub role: &'static str,
}

pub const ROLE_SECRETS: &[RoleSecret] = &[
    RoleSecret {
        suffix: "CLOUD_FORMATION_DEPLOY_ROLE",
        role: DEPLOY_ROLE,
    },
    RoleSecret {
        suffix: "CLOUD_FORMATION_CHECK_VERSION_ROLE",
        role: CHECK_VERSION_ROLE,
    },
    RoleSecret {
        suffix: "CLOUD_FORMATION_CREATE_CHANGESET_ROLE",
        role: PREPARE_CHANGESET_ROLE,
    },
    RoleSecret {
        suffix: "CDK_PULL_IMAGE_ROLE",
        role: CDK_PULL_IMAGE_ROLE,
    },
    RoleSecret {
        suffix: "CDK_PUSH_IMAGE_ROLE",
        role: CDK_PUSH_IMAGE_ROLE,
    },
];

/// Role values of one environment, keyed by role name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    values: BTreeMap<&'static str, Option<String>>,
}

impl Roles {
    /// Value of `role`; `None` for optional roles the environment lacks.
    pub fn get(&self, role: &str) -> Option<&str> {
        self.values.get(role).and_then(|value| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        self.values
            .iter()
            .map(|(role, value)| (*role, value.as_deref()))
    }
}

pub fn resolve_roles(exports: &ExportSet) -> Result<Roles, ProvisionError> {
    let mut values = BTreeMap::new();
    for entry in ROLE_EXPORTS {
        values.insert(entry.role, exports.named(entry.export, entry.required)?);
    }
    Ok(Roles { values })
}

/// Where the local value of an account secret lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable `<env>_<logical>`.
    EnvVar,
    /// File `<secrets-dir>/<env>_<logical>`.
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSecret {
    pub logical: &'static str,
    pub export: &'static str,
    pub required: bool,
    pub source: SecretSource,
}

impl AccountSecret {
    /// Variable or file name holding the value for `environment`.
    pub fn local_name(&self, environment: &str) -> String {
        format!("{environment}_{}", self.logical)
    }
}

const fn account(
    logical: &'static str,
    export: &'static str,
    source: SecretSource,
) -> AccountSecret {
    AccountSecret {
        logical,
        export,
        required: true,
        source,
    }
}

pub const ACCOUNT_SECRETS: &[AccountSecret] = &[
    account(
        "slack_webhook_url",
        "account-resources:SlackWebHookUrl",
        SecretSource::EnvVar,
    ),
    account(
        "splunk_hec_token",
        "account-resources:SplunkHECToken",
        SecretSource::EnvVar,
    ),
    account(
        "jira_token",
        "account-resources:JiraToken",
        SecretSource::EnvVar,
    ),
    account(
        "confluence_token",
        "account-resources:ConfluenceToken",
        SecretSource::EnvVar,
    ),
    account(
        "spine_asid",
        "account-resources:SpineASID",
        SecretSource::EnvVar,
    ),
    account(
        "spine_ca_chain",
        "account-resources:SpineCAChain",
        SecretSource::File,
    ),
    account(
        "spine_public_certificate",
        "account-resources:SpinePublicCertificate",
        SecretSource::File,
    ),
    account(
        "spine_private_key",
        "account-resources:SpinePrivateKey",
        SecretSource::File,
    ),
    account(
        "spine_party_key",
        "account-resources:SpinePartyKey",
        SecretSource::EnvVar,
    ),
    account(
        "eps_signing_cert_chain",
        "secrets:epsSigningCertChain",
        SecretSource::File,
    ),
    account(
        "service_search_api_key",
        "account-resources:ServiceSearchApiKey",
        SecretSource::EnvVar,
    ),
    account(
        "PSU_proxygen_private_key",
        "account-resources:PSUProxygenPrivateKey",
        SecretSource::File,
    ),
    account(
        "PSU_proxygen_public_key",
        "account-resources:PSUProxygenPublicKey",
        SecretSource::File,
    ),
    account(
        "CPSU_proxygen_private_key",
        "account-resources:CPSUProxygenPrivateKey",
        SecretSource::File,
    ),
    account(
        "CPSU_proxygen_public_key",
        "account-resources:CPSUProxygenPublicKey",
        SecretSource::File,
    ),
    account(
        "ClinicalTracker_proxygen_private_key",
        "account-resources:ClinicalTrackerProxygenPrivateKey",
        SecretSource::File,
    ),
    account(
        "ClinicalTracker_proxygen_public_key",
        "account-resources:ClinicalTrackerProxygenPublicKey",
        SecretSource::File,
    ),
    account(
        "FhirDispensing_proxygen_private_key",
        "secrets:FhirDispensingProxygenPrivateKey",
        SecretSource::File,
    ),
    account(
        "FhirDispensing_proxygen_public_key",
        "secrets:FhirDispensingProxygenPublicKey",
        SecretSource::File,
    ),
    account(
        "ptl_prescription_signing_public_key",
        "secrets:ptlPrescriptionSigningPublicKey",
        SecretSource::File,
    ),
    AccountSecret {
        logical: "ptl_prescription_signing_private_key",
        export: "secrets:ptlPrescriptionSigningPrivateKey",
        required: false,
        source: SecretSource::File,
    },
    account(
        "PSUNotify_callback_api_key",
        "secrets:PSUNotifyCallbackApiKey",
        SecretSource::EnvVar,
    ),
    account(
        "PSUNotify_callback_app_name",
        "secrets:PSUNotifyCallbackAppName",
        SecretSource::EnvVar,
    ),
    account(
        "PSUNotify_kid_secret",
        "secrets:PSUNotifyKidSecret",
        SecretSource::EnvVar,
    ),
    account(
        "PSUNotify_private_key_secret",
        "secrets:PSUNotifyPrivateKeySecret",
        SecretSource::File,
    ),
];
