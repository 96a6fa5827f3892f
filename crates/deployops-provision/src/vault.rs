use crate::command::ToolCall;
use crate::error::ProvisionError;
use crate::secret::SecretValue;
use secrecy::ExposeSecret;

/// Destination for account-level secret values.
pub trait SecretsVault {
    fn put_secret_value(&self, secret_id: &str, value: &SecretValue) -> Result<(), ProvisionError>;
}

/// `aws secretsmanager` adapter; the value is streamed on stdin.
#[derive(Debug, Clone)]
pub struct AwsCliVault {
    profile: String,
}

impl AwsCliVault {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

impl SecretsVault for AwsCliVault {
    fn put_secret_value(&self, secret_id: &str, value: &SecretValue) -> Result<(), ProvisionError> {
        ToolCall::new(
            "aws",
            vec![
                "secretsmanager".to_string(),
                "put-secret-value".to_string(),
                "--profile".to_string(),
                self.profile.clone(),
                "--secret-id".to_string(),
                secret_id.to_string(),
                "--secret-string".to_string(),
                "file:///dev/stdin".to_string(),
            ],
        )
        .stdin(value.expose_secret().as_bytes())
        .run()?;
        Ok(())
    }
}
