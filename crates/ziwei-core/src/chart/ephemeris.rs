//! Chart adapter over the external ephemeris.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::birth::BirthInput;
use crate::chart::Chart;
use crate::error::{Result, ZiweiError};

/// Locale requested from the ephemeris.
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// Arguments of a `computeByGregorian`-style ephemeris call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemerisRequest {
    /// `YYYY-MM-DD`
    pub solar_date: String,
    /// Earthly-branch index of the birth hour (0..=11).
    pub time_index: u8,
    /// `男` or `女`
    pub gender: String,
    pub fix_true_solar_time: bool,
    pub locale: String,
}

impl EphemerisRequest {
    pub fn from_input(input: &BirthInput) -> Self {
        Self {
            solar_date: input.date_string(),
            time_index: input.time_branch_index(),
            gender: input.gender.ephemeris_token().to_string(),
            fix_true_solar_time: true,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// The astrology engine that casts a chart from a Gregorian birth moment.
#[async_trait]
pub trait Ephemeris: Send + Sync {
    async fn compute_by_gregorian(&self, request: &EphemerisRequest) -> Result<Chart>;
}

/// Casts the chart for `input`.
///
/// Collaborator failures and charts that break the structural invariants are
/// both reported as [`ZiweiError::EphemerisUnavailable`].
pub async fn compute_chart(ephemeris: &dyn Ephemeris, input: &BirthInput) -> Result<Chart> {
    let request = EphemerisRequest::from_input(input);
    tracing::debug!(
        solar_date = %request.solar_date,
        time_index = request.time_index,
        gender = %request.gender,
        "Computing chart"
    );

    let chart = ephemeris
        .compute_by_gregorian(&request)
        .await
        .map_err(|err| match err {
            ZiweiError::EphemerisUnavailable(_) => err,
            other => ZiweiError::ephemeris(other.to_string()),
        })?;

    chart.validate()?;
    Ok(chart)
}
