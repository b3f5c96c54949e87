//! Configuration models.
//!
//! `AppConfig` mirrors `config.toml`, `SecretConfig` mirrors `secret.json`.
//! Every field has a default so a missing or partial file is valid.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZiweiError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_EXPERT_TEMPERATURE: f32 = 0.7;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub ephemeris: EphemerisSettings,
    #[serde(default)]
    pub llm: LlmSettings,
}

/// How to reach the external ephemeris.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EphemerisSettings {
    /// Program spawned per chart; receives the request on stdin.
    #[serde(default = "default_ephemeris_command")]
    pub command: String,
    #[serde(default = "default_ephemeris_args")]
    pub args: Vec<String>,
    /// A precomputed chart used instead of spawning `command`.
    #[serde(default)]
    pub chart_file: Option<PathBuf>,
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            command: default_ephemeris_command(),
            args: default_ephemeris_args(),
            chart_file: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Overall deadline for one streamed request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_expert_temperature")]
    pub expert_temperature: f32,
    #[serde(default)]
    pub deepseek: ProviderSettings,
    #[serde(default)]
    pub zhipu: ProviderSettings,
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            expert_temperature: DEFAULT_EXPERT_TEMPERATURE,
            deepseek: ProviderSettings::default(),
            zhipu: ProviderSettings::default(),
        }
    }
}

/// Optional endpoint overrides for one provider.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Hosted OpenAI-compatible chat-completion services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Serves the one-shot expert report.
    DeepSeek,
    /// Serves the multi-turn consultation.
    Zhipu,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek",
            Provider::Zhipu => "zhipu",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Provider::DeepSeek => "https://api.deepseek.com/chat/completions",
            Provider::Zhipu => "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek-chat",
            Provider::Zhipu => "glm-4-plus",
        }
    }

    /// Environment variables consulted for the API key, in priority order.
    pub fn key_env_vars(self) -> [&'static str; 2] {
        match self {
            Provider::DeepSeek => ["VITE_DEEPSEEK_API_KEY", "DEEPSEEK_API_KEY"],
            Provider::Zhipu => ["VITE_ZHIPU_API_KEY", "ZHIPU_API_KEY"],
        }
    }

    pub fn settings(self, llm: &LlmSettings) -> &ProviderSettings {
        match self {
            Provider::DeepSeek => &llm.deepseek,
            Provider::Zhipu => &llm.zhipu,
        }
    }

    pub fn secret(self, secrets: &SecretConfig) -> Option<&ProviderSecret> {
        match self {
            Provider::DeepSeek => secrets.deepseek.as_ref(),
            Provider::Zhipu => secrets.zhipu.as_ref(),
        }
    }
}

impl FromStr for Provider {
    type Err = ZiweiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Ok(Provider::DeepSeek),
            "zhipu" | "glm" => Ok(Provider::Zhipu),
            other => Err(ZiweiError::input(format!("unknown provider '{other}'"))),
        }
    }
}

/// Root of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default)]
    pub deepseek: Option<ProviderSecret>,
    #[serde(default)]
    pub zhipu: Option<ProviderSecret>,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProviderSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl std::fmt::Debug for ProviderSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSecret")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}

fn default_ephemeris_command() -> String {
    "node".to_string()
}

fn default_ephemeris_args() -> Vec<String> {
    vec!["scripts/iztro-bridge.mjs".to_string()]
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_expert_temperature() -> f32 {
    DEFAULT_EXPERT_TEMPERATURE
}
