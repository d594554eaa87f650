//! Service-level document store credentials
//!
//! Loaded once at startup and handed to the clients that need them. Nothing
//! here is global; callers hold an `Arc<StoreCredentials>`.

use std::fmt;
use std::path::Path;

use eyre::{Context, Result};
use serde::Deserialize;
use tracing::info;

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Access key pair for the template document store
#[derive(Clone, Deserialize)]
pub struct StoreCredentials {
    pub key: String,
    secret: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl StoreCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            region: region.into(),
        }
    }

    /// Read `{"key": ..., "secret": ..., "region": ...}` from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read credentials file {}", path.display()))?;
        let creds: Self = serde_json::from_str(&content).context("Failed to parse credentials file")?;
        if creds.key.is_empty() || creds.secret.is_empty() {
            return Err(eyre::eyre!("Credentials file {} has an empty key or secret", path.display()));
        }
        info!(path = %path.display(), region = %creds.region, "Loaded store credentials");
        Ok(creds)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}
