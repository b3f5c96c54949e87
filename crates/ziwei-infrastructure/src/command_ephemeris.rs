//! Ephemeris backed by an external process.
//!
//! The process receives one `EphemerisRequest` as JSON on stdin and must
//! print one astrolabe JSON document on stdout, e.g. a small Node script
//! calling `astro.bySolar` from iztro.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use ziwei_core::chart::{Chart, Ephemeris, EphemerisRequest};
use ziwei_core::config::EphemerisSettings;
use ziwei_core::{Result, ZiweiError};

use crate::dto::AstrolabeDto;

/// The request is forwarded exactly as given.
pub struct CommandEphemeris {
    program: String,
    args: Vec<String>,
}

impl CommandEphemeris {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &EphemerisSettings) -> Self {
        Self::new(settings.command.clone(), settings.args.clone())
    }
}

#[async_trait]
impl Ephemeris for CommandEphemeris {
    async fn compute_by_gregorian(&self, request: &EphemerisRequest) -> Result<Chart> {
        let payload = serde_json::to_vec(request)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, args = ?self.args, "Spawning ephemeris");
        let mut child = cmd.spawn().map_err(|e| {
            ZiweiError::ephemeris(format!("failed to spawn '{}': {e}", self.program))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A process that ignores stdin may exit before reading it; its
            // exit status and output still decide the outcome.
            let written = match stdin.write_all(&payload).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(program = %self.program, "Ephemeris closed stdin early");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZiweiError::ephemeris(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let dto: AstrolabeDto = serde_json::from_slice(&output.stdout)
            .map_err(|e| ZiweiError::ephemeris(format!("unreadable ephemeris output: {e}")))?;
        Ok(dto.into())
    }
}
