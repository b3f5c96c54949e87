use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ziwei_application::{Mode, ModeState};

use super::context::AppContext;
use super::output;
use crate::BirthArgs;

/// Streams the expert report for one chart to stdout.
pub async fn run(context: &AppContext, birth: &BirthArgs) -> Result<()> {
    let input = birth.to_input()?;
    let view = context.chart_view(&input).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = context.orchestrator(tx);
    let cancel = CancellationToken::new();

    output::drive(
        orchestrator.run_expert_analysis(&view.text, &cancel),
        &mut rx,
        &cancel,
    )
    .await?;

    // The failure text is already on screen; only the exit status is left.
    if let ModeState::Failed(_) = orchestrator.mode_state(Mode::Expert) {
        bail!("expert analysis did not complete");
    }
    Ok(())
}
