//! Secret configuration storage.
//!
//! Keys come from `~/.config/ziwei/secret.json` first, then from the
//! provider's environment variables. A key found nowhere resolves to an empty
//! string: the endpoint then rejects the request and the rejection surfaces
//! through the normal transport error path.
//!
//! # Security Note
//!
//! The file is plaintext JSON and should be mode 600. Keys are never logged.

use std::path::{Path, PathBuf};

use ziwei_core::Result;
use ziwei_core::config::{Provider, SecretConfig};

use crate::paths::ZiweiPaths;

/// Read-only storage for `secret.json`.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: ZiweiPaths::secret_file()?,
        })
    }

    /// Creates a new SecretStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, treating a missing file as "no secrets".
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// API key and optional model override for one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub model: Option<String>,
}

impl Credentials {
    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &if self.has_key() { "<set>" } else { "<empty>" })
            .field("model", &self.model)
            .finish()
    }
}

/// Resolves a provider's credentials from the process environment.
pub fn resolve_credentials(provider: Provider, secrets: &SecretConfig) -> Credentials {
    resolve_credentials_with(provider, secrets, |name| std::env::var(name).ok())
}

/// Same as [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_credentials_with(
    provider: Provider,
    secrets: &SecretConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Credentials {
    if let Some(secret) = provider.secret(secrets).filter(|s| !s.api_key.is_empty()) {
        return Credentials {
            api_key: secret.api_key.clone(),
            model: secret.model_name.clone(),
        };
    }

    let api_key = provider
        .key_env_vars()
        .into_iter()
        .find_map(|name| env(name).filter(|v| !v.is_empty()));

    if api_key.is_none() {
        tracing::warn!(
            provider = provider.name(),
            "No API key configured; requests will be rejected by the endpoint"
        );
    }

    Credentials {
        api_key: api_key.unwrap_or_default(),
        model: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziwei_core::config::ProviderSecret;

    #[test]
    fn test_file_secret_wins_over_env() {
        let secrets = SecretConfig {
            deepseek: Some(ProviderSecret {
                api_key: "from-file".into(),
                model_name: Some("deepseek-reasoner".into()),
            }),
            zhipu: None,
        };
        let creds = resolve_credentials_with(Provider::DeepSeek, &secrets, |_| {
            Some("from-env".into())
        });
        assert_eq!(creds.api_key, "from-file");
        assert_eq!(creds.model.as_deref(), Some("deepseek-reasoner"));
    }

    #[test]
    fn test_env_fallback_order() {
        let secrets = SecretConfig::default();
        let creds = resolve_credentials_with(Provider::Zhipu, &secrets, |name| match name {
            "VITE_ZHIPU_API_KEY" => None,
            "ZHIPU_API_KEY" => Some("plain".into()),
            _ => None,
        });
        assert_eq!(creds.api_key, "plain");

        let creds = resolve_credentials_with(Provider::Zhipu, &secrets, |name| {
            Some(format!("{name}-value"))
        });
        assert_eq!(creds.api_key, "VITE_ZHIPU_API_KEY-value");
    }

    #[test]
    fn test_missing_key_resolves_empty() {
        let creds = resolve_credentials_with(Provider::DeepSeek, &SecretConfig::default(), |_| None);
        assert!(!creds.has_key());
        assert!(!format!("{creds:?}").contains("VITE"));
    }
}
