use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use super::context::AppContext;
use crate::BirthArgs;

pub async fn run(context: &AppContext, birth: &BirthArgs, output: Option<&Path>) -> Result<()> {
    let input = birth.to_input()?;
    let view = context.chart_view(&input).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &view.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}",
                format!("Chart text written to {}", path.display()).green()
            );
        }
        None => print!("{}", view.text),
    }
    Ok(())
}
