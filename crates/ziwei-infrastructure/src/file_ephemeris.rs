//! Ephemeris that replays a precomputed astrolabe file.

use std::path::PathBuf;

use async_trait::async_trait;
use ziwei_core::chart::{Chart, Ephemeris, EphemerisRequest};
use ziwei_core::{Result, ZiweiError};

use crate::dto::AstrolabeDto;

/// Returns the chart stored in a JSON file regardless of the request.
///
/// Useful offline and in tests; the request is only logged.
pub struct FileEphemeris {
    path: PathBuf,
}

impl FileEphemeris {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Ephemeris for FileEphemeris {
    async fn compute_by_gregorian(&self, request: &EphemerisRequest) -> Result<Chart> {
        tracing::debug!(
            path = %self.path.display(),
            solar_date = %request.solar_date,
            "Loading precomputed chart"
        );
        let content = tokio::fs::read(&self.path).await.map_err(|e| {
            ZiweiError::ephemeris(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let dto: AstrolabeDto = serde_json::from_slice(&content)
            .map_err(|e| ZiweiError::ephemeris(format!("malformed chart file: {e}")))?;
        Ok(dto.into())
    }
}
