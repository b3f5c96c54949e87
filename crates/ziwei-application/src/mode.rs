//! Per-mode request state.

use ziwei_core::{Result, ZiweiError};

/// The two conversation modes; each allows one request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Expert,
    Chat,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Expert => "expert analysis",
            Mode::Chat => "chat",
        }
    }
}

/// `Idle -> Streaming -> Idle | Failed`, and `Failed -> Streaming` on retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModeState {
    #[default]
    Idle,
    Streaming,
    Failed(String),
}

impl ModeState {
    /// The `loading` flag a view disables its controls on.
    pub fn is_loading(&self) -> bool {
        matches!(self, ModeState::Streaming)
    }

    pub fn begin(&mut self, mode: Mode) -> Result<()> {
        if self.is_loading() {
            return Err(ZiweiError::Busy(mode.label()));
        }
        *self = ModeState::Streaming;
        Ok(())
    }

    pub fn finish(&mut self) {
        *self = ModeState::Idle;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = ModeState::Failed(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = ModeState::default();
        assert!(!state.is_loading());

        state.begin(Mode::Chat).unwrap();
        assert!(state.is_loading());

        let err = state.begin(Mode::Chat).unwrap_err();
        assert!(err.is_busy());
        assert_eq!(err.to_string(), "a chat request is already in flight");

        state.fail("连接异常: x");
        assert!(!state.is_loading());
        state.begin(Mode::Chat).unwrap();
        state.finish();
        assert_eq!(state, ModeState::Idle);
    }
}
