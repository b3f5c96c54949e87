//! Conversation orchestrator.
//!
//! Owns the [`SessionState`] a view observes and drives the streaming
//! transport for the two modes: the one-shot expert report and the
//! multi-turn consultation. Tokens are written into the session as they
//! arrive and are also published as [`SessionEvent`]s when a sender is
//! attached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use ziwei_core::config::LlmSettings;
use ziwei_core::session::{ActiveView, SessionEvent, SessionState};
use ziwei_core::{Result, ZiweiError};
use ziwei_interaction::{ChatCompletionRequest, ChatTransport, ProviderTarget, StreamHandler};

use crate::messages::{consultation_messages, expert_messages};
use crate::mode::{Mode, ModeState};

const EXPERT_FAILURE_PREFIX: &str = "分析失败: ";
const EXPERT_FALLBACK_MESSAGE: &str = "网络连接或 API Key 异常";
const CHAT_FAILURE_PREFIX: &str = "连接异常: ";
const CHAT_FALLBACK_MESSAGE: &str = "请重试";

/// Supplies the local date for the consultation's date message.
pub type TodayFn = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Default)]
struct Shared {
    session: SessionState,
    expert: ModeState,
    chat: ModeState,
}

impl Shared {
    fn mode(&self, mode: Mode) -> &ModeState {
        match mode {
            Mode::Expert => &self.expert,
            Mode::Chat => &self.chat,
        }
    }

    fn mode_mut(&mut self, mode: Mode) -> &mut ModeState {
        match mode {
            Mode::Expert => &mut self.expert,
            Mode::Chat => &mut self.chat,
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn emit(events: &Option<UnboundedSender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = events {
        if tx.send(event).is_err() {
            tracing::trace!("Session event receiver dropped");
        }
    }
}

fn failure_text(prefix: &str, fallback: &str, error: &ZiweiError) -> String {
    let message = error.to_string();
    if message.is_empty() {
        format!("{prefix}{fallback}")
    } else {
        format!("{prefix}{message}")
    }
}

/// Drives both conversation modes against one [`ChatTransport`].
///
/// Each mode admits one request at a time; a second call while the first is
/// streaming fails with [`ZiweiError::Busy`] and leaves the session untouched.
/// Changing the birth input does not reset anything here: the report and the
/// chat log persist until the user replaces them.
pub struct ConversationOrchestrator {
    transport: Arc<dyn ChatTransport>,
    expert_target: ProviderTarget,
    chat_target: ProviderTarget,
    expert_temperature: f32,
    max_tokens: u32,
    shared: Arc<Mutex<Shared>>,
    events: Option<UnboundedSender<SessionEvent>>,
    today: TodayFn,
}

impl ConversationOrchestrator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        expert_target: ProviderTarget,
        chat_target: ProviderTarget,
        llm: &LlmSettings,
    ) -> Self {
        Self {
            transport,
            expert_target,
            chat_target,
            expert_temperature: llm.expert_temperature,
            max_tokens: llm.max_tokens,
            shared: Arc::new(Mutex::new(Shared::default())),
            events: None,
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Starts from an existing session instead of an empty one.
    pub fn with_session(self, session: SessionState) -> Self {
        lock(&self.shared).session = session;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    /// A snapshot of the session.
    pub fn session(&self) -> SessionState {
        lock(&self.shared).session.clone()
    }

    pub fn expert_report(&self) -> String {
        lock(&self.shared).session.expert_report.clone()
    }

    pub fn mode_state(&self, mode: Mode) -> ModeState {
        lock(&self.shared).mode(mode).clone()
    }

    pub fn is_loading(&self, mode: Mode) -> bool {
        lock(&self.shared).mode(mode).is_loading()
    }

    pub fn active_view(&self) -> ActiveView {
        lock(&self.shared).session.active_view
    }

    pub fn set_active_view(&self, view: ActiveView) {
        lock(&self.shared).session.active_view = view;
    }

    /// Streams a fresh expert report for `chart_text` into the report slot.
    ///
    /// The slot is cleared first. Transport failures are written into the
    /// slot as `分析失败: {message}` rather than returned; only a concurrent
    /// call is an `Err`. After cancellation or timeout whatever streamed so
    /// far is kept.
    pub async fn run_expert_analysis(
        &self,
        chart_text: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        {
            let mut shared = lock(&self.shared);
            shared.expert.begin(Mode::Expert)?;
            shared.session.expert_report.clear();
        }
        emit(&self.events, SessionEvent::AnalysisStarted);

        let request =
            ChatCompletionRequest::new(self.expert_target.model.clone(), expert_messages(chart_text))
                .with_temperature(self.expert_temperature)
                .with_max_tokens(self.max_tokens);

        tracing::info!(model = %request.model, "Running expert analysis");
        let mut handler = ReplyHandler::new(Mode::Expert, self.shared.clone(), self.events.clone());
        self.transport
            .stream_chat(&self.expert_target.endpoint, &request, &mut handler, cancel)
            .await;
        Ok(())
    }

    /// Sends one consultation turn.
    ///
    /// Rejects blank text with [`ZiweiError::InputValidation`]. Otherwise
    /// appends the user message and an empty assistant reply, then streams
    /// the answer into that reply. Failures overwrite the reply with
    /// `连接异常: {message}`.
    pub async fn send_message(
        &self,
        chart_text: &str,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if user_text.trim().is_empty() {
            return Err(ZiweiError::input("message is empty"));
        }

        let today = (self.today)();
        let messages = {
            let mut shared = lock(&self.shared);
            shared.chat.begin(Mode::Chat)?;
            let messages = consultation_messages(
                chart_text,
                &shared.session.expert_report,
                &shared.session.chat_log,
                user_text,
                today,
            );
            shared.session.begin_chat_turn(user_text);
            messages
        };
        emit(&self.events, SessionEvent::ChatStarted);

        let request = ChatCompletionRequest::new(self.chat_target.model.clone(), messages)
            .with_max_tokens(self.max_tokens);

        tracing::info!(model = %request.model, turns = request.messages.len(), "Sending chat turn");
        let mut handler = ReplyHandler::new(Mode::Chat, self.shared.clone(), self.events.clone());
        self.transport
            .stream_chat(&self.chat_target.endpoint, &request, &mut handler, cancel)
            .await;
        Ok(())
    }
}

/// Applies one request's callbacks to the session slot of its mode.
struct ReplyHandler {
    mode: Mode,
    shared: Arc<Mutex<Shared>>,
    events: Option<UnboundedSender<SessionEvent>>,
    received: bool,
    settled: bool,
}

impl ReplyHandler {
    fn new(mode: Mode, shared: Arc<Mutex<Shared>>, events: Option<UnboundedSender<SessionEvent>>) -> Self {
        Self {
            mode,
            shared,
            events,
            received: false,
            settled: false,
        }
    }
}

impl StreamHandler for ReplyHandler {
    fn on_token(&mut self, token: &str) {
        self.received = true;
        {
            let mut shared = lock(&self.shared);
            match self.mode {
                Mode::Expert => shared.session.expert_report.push_str(token),
                Mode::Chat => {
                    shared.session.append_to_reply(token);
                }
            }
        }
        let event = match self.mode {
            Mode::Expert => SessionEvent::AnalysisToken(token.to_string()),
            Mode::Chat => SessionEvent::ChatToken(token.to_string()),
        };
        emit(&self.events, event);
    }

    fn on_complete(&mut self, _full_content: &str) {
        self.settled = true;
        lock(&self.shared).mode_mut(self.mode).finish();
        let event = match self.mode {
            Mode::Expert => SessionEvent::AnalysisFinished,
            Mode::Chat => SessionEvent::ChatFinished,
        };
        emit(&self.events, event);
    }

    fn on_error(&mut self, error: ZiweiError) {
        self.settled = true;
        let text = match self.mode {
            Mode::Expert => failure_text(EXPERT_FAILURE_PREFIX, EXPERT_FALLBACK_MESSAGE, &error),
            Mode::Chat => failure_text(CHAT_FAILURE_PREFIX, CHAT_FALLBACK_MESSAGE, &error),
        };
        // A cancelled or timed-out reply keeps its partial text; the failure
        // text only fills a slot that received nothing.
        let overwrite = !(error.is_aborted() && self.received);

        {
            let mut shared = lock(&self.shared);
            if overwrite {
                match self.mode {
                    Mode::Expert => shared.session.expert_report = text.clone(),
                    Mode::Chat => {
                        shared.session.replace_reply(text.clone());
                    }
                }
            }
            shared.mode_mut(self.mode).fail(text.clone());
        }

        tracing::warn!(mode = self.mode.label(), %error, "Request failed");
        let event = match self.mode {
            Mode::Expert => SessionEvent::AnalysisFailed(text),
            Mode::Chat => SessionEvent::ChatFailed(text),
        };
        emit(&self.events, event);
    }
}

// A request dropped before either callback ran must not leave its mode stuck
// in `Streaming`.
impl Drop for ReplyHandler {
    fn drop(&mut self) {
        if !self.settled {
            lock(&self.shared).mode_mut(self.mode).finish();
        }
    }
}
