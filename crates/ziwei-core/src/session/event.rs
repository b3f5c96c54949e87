use serde::{Deserialize, Serialize};

/// Notifications published while the orchestrator mutates the session.
///
/// The in-place buffers in [`super::SessionState`] stay the source of truth;
/// these events let a view render progress without polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    AnalysisStarted,
    AnalysisToken(String),
    AnalysisFinished,
    /// Carries the user-facing failure text (`分析失败: ...`).
    AnalysisFailed(String),
    /// A user message and its empty assistant reply were appended.
    ChatStarted,
    ChatToken(String),
    ChatFinished,
    /// Carries the user-facing failure text (`连接异常: ...`).
    ChatFailed(String),
}
