//! Birth input to chart and canonical text.

use ziwei_core::chart::{Chart, Ephemeris, compute_chart};
use ziwei_core::{BirthInput, Result, render_tree};

/// A computed chart together with the text every LLM request carries.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub input: BirthInput,
    pub chart: Chart,
    pub text: String,
}

/// Recomputes the chart whenever the birth input changes.
pub struct ChartService {
    ephemeris: Box<dyn Ephemeris>,
}

impl ChartService {
    pub fn new(ephemeris: Box<dyn Ephemeris>) -> Self {
        Self { ephemeris }
    }

    pub async fn build(&self, input: &BirthInput) -> Result<ChartView> {
        let chart = compute_chart(self.ephemeris.as_ref(), input).await?;
        let text = render_tree(&chart, input);
        tracing::debug!(
            date = %input.date_string(),
            time = %input.time_string(),
            bytes = text.len(),
            "Chart computed"
        );
        Ok(ChartView {
            input: input.clone(),
            chart,
            text,
        })
    }
}
