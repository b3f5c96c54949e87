//! Per-tab session state observed by the view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, MessageRole};
use crate::error::{Result, ZiweiError};

/// The four top-level views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Chart,
    Text,
    Analysis,
    Chat,
}

impl ActiveView {
    pub const ALL: [ActiveView; 4] = [
        ActiveView::Chart,
        ActiveView::Text,
        ActiveView::Analysis,
        ActiveView::Chat,
    ];

    /// Navigation label.
    pub fn label(self) -> &'static str {
        match self {
            ActiveView::Chart => "命盘",
            ActiveView::Text => "报告",
            ActiveView::Analysis => "AI",
            ActiveView::Chat => "咨询",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActiveView::Chart => "chart",
            ActiveView::Text => "text",
            ActiveView::Analysis => "analysis",
            ActiveView::Chat => "chat",
        }
    }
}

impl FromStr for ActiveView {
    type Err = ZiweiError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ActiveView::ALL
            .into_iter()
            .find(|v| v.as_str() == s || v.label() == s)
            .ok_or_else(|| ZiweiError::input(format!("unknown view '{s}'")))
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expert report, chat log and current view.
///
/// Deliberately survives birth-input edits: only the user re-running an
/// analysis replaces the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub expert_report: String,
    pub chat_log: Vec<ChatMessage>,
    pub active_view: ActiveView,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user message and the empty assistant reply it awaits.
    pub fn begin_chat_turn(&mut self, user_text: impl Into<String>) {
        self.chat_log.push(ChatMessage::user(user_text));
        self.chat_log.push(ChatMessage::assistant_placeholder());
    }

    /// Appends a streamed token to the trailing assistant message.
    ///
    /// Returns `false` when the log does not end in an assistant message.
    pub fn append_to_reply(&mut self, token: &str) -> bool {
        match self.chat_log.last_mut() {
            Some(last) if last.role == MessageRole::Assistant => {
                last.content.push_str(token);
                true
            }
            _ => false,
        }
    }

    /// Overwrites the trailing assistant message.
    pub fn replace_reply(&mut self, content: impl Into<String>) -> bool {
        match self.chat_log.last_mut() {
            Some(last) if last.role == MessageRole::Assistant => {
                last.content = content.into();
                true
            }
            _ => false,
        }
    }

    /// Whether the log is `user, assistant, user, assistant, ...`.
    pub fn chat_alternates(&self) -> bool {
        self.chat_log.iter().enumerate().all(|(i, m)| {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            m.role == expected
        })
    }
}
