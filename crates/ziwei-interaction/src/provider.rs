//! Endpoint and model selection per hosted provider.

use ziwei_core::config::{LlmSettings, Provider, SecretConfig};
use ziwei_infrastructure::{Credentials, resolve_credentials};

use crate::streaming::Endpoint;

/// Resolved endpoint and model for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTarget {
    pub provider: Provider,
    pub endpoint: Endpoint,
    pub model: String,
}

impl ProviderTarget {
    /// Resolves credentials from `secrets` and the process environment.
    pub fn resolve(provider: Provider, llm: &LlmSettings, secrets: &SecretConfig) -> Self {
        Self::from_credentials(provider, llm, resolve_credentials(provider, secrets))
    }

    /// URL: config override, then the provider default.
    /// Model: config override, then the secret file's `model_name`, then the
    /// provider default.
    pub fn from_credentials(provider: Provider, llm: &LlmSettings, credentials: Credentials) -> Self {
        let settings = provider.settings(llm);
        let url = settings
            .url
            .clone()
            .unwrap_or_else(|| provider.default_url().to_string());
        let model = settings
            .model
            .clone()
            .or(credentials.model)
            .unwrap_or_else(|| provider.default_model().to_string());

        Self {
            provider,
            endpoint: Endpoint::new(url, credentials.api_key),
            model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziwei_core::config::ProviderSettings;

    fn creds(model: Option<&str>) -> Credentials {
        Credentials {
            api_key: "sk-test".to_string(),
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_per_provider() {
        let llm = LlmSettings::default();

        let deepseek = ProviderTarget::from_credentials(Provider::DeepSeek, &llm, creds(None));
        assert_eq!(deepseek.endpoint.url, "https://api.deepseek.com/chat/completions");
        assert_eq!(deepseek.model, "deepseek-chat");
        assert_eq!(deepseek.endpoint.api_key, "sk-test");

        let zhipu = ProviderTarget::from_credentials(Provider::Zhipu, &llm, creds(None));
        assert_eq!(
            zhipu.endpoint.url,
            "https://open.bigmodel.cn/api/paas/v4/chat/completions"
        );
        assert_eq!(zhipu.model, "glm-4-plus");
    }

    #[test]
    fn test_config_overrides_beat_secret_model() {
        let mut llm = LlmSettings::default();
        llm.zhipu = ProviderSettings {
            url: Some("http://127.0.0.1:9/v1/chat/completions".into()),
            model: Some("glm-4-flash".into()),
        };

        let target = ProviderTarget::from_credentials(Provider::Zhipu, &llm, creds(Some("glm-4")));
        assert_eq!(target.endpoint.url, "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(target.model, "glm-4-flash");

        let target =
            ProviderTarget::from_credentials(Provider::DeepSeek, &llm, creds(Some("deepseek-reasoner")));
        assert_eq!(target.model, "deepseek-reasoner");
    }
}
