//! One-line connectivity check against a provider.

use std::io::Write;

use anyhow::{Result, bail};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use ziwei_core::ZiweiError;
use ziwei_core::config::Provider;
use ziwei_interaction::{ChatCompletionRequest, ChatTransport, RequestMessage, StreamHandler};

use super::context::AppContext;

#[derive(Default)]
struct ProbeHandler {
    reply: String,
    error: Option<ZiweiError>,
}

impl StreamHandler for ProbeHandler {
    fn on_token(&mut self, token: &str) {
        print!("{token}");
        let _ = std::io::stdout().flush();
    }

    fn on_complete(&mut self, full_content: &str) {
        self.reply = full_content.to_string();
    }

    fn on_error(&mut self, error: ZiweiError) {
        self.error = Some(error);
    }
}

pub async fn run(context: &AppContext, provider: &str, message: &str) -> Result<()> {
    let provider: Provider = provider.parse()?;
    let target = context.target(provider);

    let key_state = if target.endpoint.api_key.is_empty() {
        "Missing".red()
    } else {
        "Present".green()
    };
    println!("{} {}", format!("Testing {} API key:", provider.name()).bright_black(), key_state);
    println!("{} {}", "Endpoint:".bright_black(), target.endpoint.url);
    println!("{} {}", "Model:".bright_black(), target.model);

    let request = ChatCompletionRequest::new(target.model.clone(), vec![RequestMessage::user(message)]);
    let mut handler = ProbeHandler::default();
    let cancel = CancellationToken::new();
    context
        .transport()
        .stream_chat(&target.endpoint, &request, &mut handler, &cancel)
        .await;
    println!();

    match handler.error {
        Some(error) => {
            eprintln!("{}", format!("Error: {error}").red());
            bail!("{} probe failed", provider.name());
        }
        None => {
            tracing::debug!(chars = handler.reply.chars().count(), "Probe reply received");
            println!("{}", "Success!".bright_green());
            Ok(())
        }
    }
}
