use crate::error::ProvisionError;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::fs;
use std::path::Path;

/// Secret material that never prints itself.
///
/// Read it through [`ExposeSecret`] only where it is handed to a provider.
pub struct SecretValue(SecretString);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl ExposeSecret<str> for SecretValue {
    fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretValue {
    fn clone(&self) -> Self {
        Self::new(self.expose_secret())
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(<redacted, {} bytes>)", self.len())
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Read a secret from disk. A missing file is an absent value, not an error.
pub fn read_secret_file(path: &Path) -> Result<Option<SecretValue>, ProvisionError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(SecretValue::new(text))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "secret file not found");
            Ok(None)
        }
        Err(source) => Err(ProvisionError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
