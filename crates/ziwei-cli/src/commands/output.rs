//! Live rendering of session events while a request streams.

use std::future::Future;
use std::io::Write;

use colored::Colorize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use ziwei_core::session::SessionEvent;

pub const ANALYSIS_PLACEHOLDER: &str = "大师正在推演流年大限，请稍候...";

/// Runs `request` to completion, printing events as they arrive.
///
/// Ctrl-C cancels `cancel` once; the request then settles on its own and the
/// remaining events are drained before returning.
pub async fn drive<F>(
    request: F,
    events: &mut UnboundedReceiver<SessionEvent>,
    cancel: &CancellationToken,
) -> F::Output
where
    F: Future,
{
    tokio::pin!(request);

    let output = loop {
        tokio::select! {
            output = &mut request => break output,
            Some(event) = events.recv() => render(&event),
            result = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {e}");
                }
                cancel.cancel();
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        render(&event);
    }
    output
}

fn render(event: &SessionEvent) {
    match event {
        SessionEvent::AnalysisStarted => {
            println!("{}", ANALYSIS_PLACEHOLDER.bright_black());
        }
        SessionEvent::AnalysisToken(token) | SessionEvent::ChatToken(token) => {
            print!("{token}");
            let _ = std::io::stdout().flush();
        }
        SessionEvent::AnalysisFinished | SessionEvent::ChatFinished => println!(),
        SessionEvent::AnalysisFailed(text) | SessionEvent::ChatFailed(text) => {
            println!();
            println!("{}", text.red());
        }
        SessionEvent::ChatStarted => {
            print!("{} ", "AI:".bright_blue().bold());
            let _ = std::io::stdout().flush();
        }
    }
}
