//! Configuration, secrets and service wiring shared by every subcommand.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedSender;
use ziwei_application::{ChartService, ChartView, ConversationOrchestrator};
use ziwei_core::config::{AppConfig, Provider, SecretConfig};
use ziwei_core::session::SessionEvent;
use ziwei_core::BirthInput;
use ziwei_infrastructure::{ConfigStorage, SecretStorage, ephemeris_from_settings};
use ziwei_interaction::{ProviderTarget, StreamingClient};

use crate::BirthArgs;

pub struct AppContext {
    pub config: AppConfig,
    pub secrets: SecretConfig,
    chart_service: ChartService,
}

impl AppContext {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let storage = match config_path {
            Some(path) => ConfigStorage::with_path(path.to_path_buf()),
            None => ConfigStorage::new()?,
        };
        let config = storage
            .load()
            .with_context(|| format!("Failed to load {}", storage.path().display()))?;

        let secret_storage = SecretStorage::new()?;
        let secrets = secret_storage
            .load()
            .with_context(|| format!("Failed to load {}", secret_storage.path().display()))?;

        Ok(Self::new(config, secrets))
    }

    pub fn new(config: AppConfig, secrets: SecretConfig) -> Self {
        let chart_service = ChartService::new(ephemeris_from_settings(&config.ephemeris));
        Self {
            config,
            secrets,
            chart_service,
        }
    }

    pub fn target(&self, provider: Provider) -> ProviderTarget {
        ProviderTarget::resolve(provider, &self.config.llm, &self.secrets)
    }

    pub fn transport(&self) -> StreamingClient {
        StreamingClient::with_timeout(self.config.llm.timeout())
    }

    pub fn orchestrator(&self, events: UnboundedSender<SessionEvent>) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            Arc::new(self.transport()),
            self.target(Provider::DeepSeek),
            self.target(Provider::Zhipu),
            &self.config.llm,
        )
        .with_events(events)
    }

    pub async fn chart_view(&self, input: &BirthInput) -> Result<ChartView> {
        self.chart_service
            .build(input)
            .await
            .context("Failed to compute chart")
    }
}

impl BirthArgs {
    /// Fields left out are taken from the current moment; gender defaults to male.
    pub fn to_input(&self) -> ziwei_core::Result<BirthInput> {
        let now = BirthInput::now();
        let date = self.date.clone().unwrap_or_else(|| now.date_string());
        let time = self.time.clone().unwrap_or_else(|| now.time_string());
        let gender = self.gender.as_deref().unwrap_or("male");

        let input = BirthInput::parse(&date, &time, gender)?;
        match self.year {
            Some(year) => input.with_year(year),
            None => Ok(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ziwei_core::Gender;
    use ziwei_core::config::ProviderSecret;

    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../ziwei-infrastructure/tests/fixtures/astrolabe.json")
    }

    #[test]
    fn test_birth_args_defaults() {
        let args = BirthArgs {
            date: Some("1990-06-15".into()),
            time: Some("12:30".into()),
            ..Default::default()
        };
        let input = args.to_input().unwrap();
        assert_eq!(input.date_string(), "1990-06-15");
        assert_eq!(input.gender, Gender::Male);

        let args = BirthArgs {
            year: Some(1988),
            ..args
        };
        assert_eq!(args.to_input().unwrap().date_string(), "1988-06-15");
    }

    #[test]
    fn test_birth_args_rejects_bad_gender() {
        let args = BirthArgs {
            gender: Some("robot".into()),
            ..Default::default()
        };
        assert!(args.to_input().unwrap_err().is_input_validation());
    }

    #[tokio::test]
    async fn test_load_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "[ephemeris]\nchart_file = {:?}\n\n[llm.zhipu]\nmodel = \"glm-4-air\"\n",
                fixture().display().to_string()
            ),
        )
        .unwrap();

        let context = AppContext::load(Some(&config_path)).unwrap();
        assert_eq!(context.target(Provider::Zhipu).model, "glm-4-air");

        let input = BirthInput::parse("1990-06-15", "12:30", "male").unwrap();
        let view = context.chart_view(&input).await.unwrap();
        assert_eq!(view.chart.palaces.len(), 12);
        assert!(view.text.starts_with("文墨天机紫微斗数命盘\n"));
    }

    #[test]
    fn test_targets_use_secrets() {
        let secrets = SecretConfig {
            deepseek: Some(ProviderSecret {
                api_key: "sk-file".into(),
                model_name: Some("deepseek-reasoner".into()),
            }),
            zhipu: None,
        };
        let context = AppContext::new(AppConfig::default(), secrets);
        let target = context.target(Provider::DeepSeek);
        assert_eq!(target.endpoint.api_key, "sk-file");
        assert_eq!(target.model, "deepseek-reasoner");
    }
}
