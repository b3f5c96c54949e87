use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use ziwei_application::{ConversationOrchestrator, Mode, ModeState};
use ziwei_core::ZiweiError;
use ziwei_core::config::{LlmSettings, Provider};
use ziwei_core::prompt::EXPERT_PROMPT;
use ziwei_core::session::{MessageRole, SessionEvent, SessionState};
use ziwei_infrastructure::Credentials;
use ziwei_interaction::{
    ChatCompletionRequest, ChatTransport, Endpoint, ProviderTarget, StreamHandler,
};

enum Script {
    Tokens(Vec<&'static str>),
    Fail(Vec<&'static str>, ZiweiError),
    UntilCancelled(Vec<&'static str>),
}

#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<(Endpoint, ChatCompletionRequest)>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn gated(script: Vec<Script>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            gate: Some(gate),
            ..Self::default()
        })
    }

    fn requests(&self) -> Vec<(Endpoint, ChatCompletionRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn stream_chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest,
        handler: &mut dyn StreamHandler,
        cancel: &CancellationToken,
    ) {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.clone(), request.clone()));
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Tokens(Vec::new()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match step {
            Script::Tokens(tokens) => {
                let mut full = String::new();
                for token in tokens {
                    full.push_str(token);
                    handler.on_token(token);
                }
                handler.on_complete(&full);
            }
            Script::Fail(tokens, error) => {
                for token in tokens {
                    handler.on_token(token);
                }
                handler.on_error(error);
            }
            Script::UntilCancelled(tokens) => {
                for token in tokens {
                    handler.on_token(token);
                }
                cancel.cancelled().await;
                handler.on_error(ZiweiError::Aborted);
            }
        }
    }
}

fn target(provider: Provider) -> ProviderTarget {
    ProviderTarget::from_credentials(
        provider,
        &LlmSettings::default(),
        Credentials {
            api_key: "sk-test".to_string(),
            model: None,
        },
    )
}

fn orchestrator(transport: Arc<ScriptedTransport>) -> ConversationOrchestrator {
    ConversationOrchestrator::new(
        transport,
        target(Provider::DeepSeek),
        target(Provider::Zhipu),
        &LlmSettings::default(),
    )
    .with_today(|| NaiveDate::from_ymd_opt(2024, 5, 3).unwrap())
}

#[tokio::test]
async fn test_expert_report_streams_into_slot() {
    let transport = ScriptedTransport::new(vec![Script::Tokens(vec!["你", "好"])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orch = orchestrator(transport.clone()).with_events(tx);

    orch.run_expert_analysis("CHART", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(orch.expert_report(), "你好");
    assert!(!orch.is_loading(Mode::Expert));
    assert_eq!(orch.mode_state(Mode::Expert), ModeState::Idle);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let (endpoint, request) = &requests[0];
    assert_eq!(endpoint.url, "https://api.deepseek.com/chat/completions");
    assert_eq!(endpoint.api_key, "sk-test");
    assert_eq!(request.model, "deepseek-chat");
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.max_tokens, Some(4096));
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].content, EXPERT_PROMPT);
    assert_eq!(request.messages[1].content, "CHART");

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            SessionEvent::AnalysisStarted,
            SessionEvent::AnalysisToken("你".into()),
            SessionEvent::AnalysisToken("好".into()),
            SessionEvent::AnalysisFinished,
        ]
    );
}

#[tokio::test]
async fn test_expert_failure_surfaces_in_report() {
    let transport = ScriptedTransport::new(vec![Script::Fail(
        vec!["partial"],
        ZiweiError::http(500, Some("X".into())),
    )]);
    let orch = orchestrator(transport);

    orch.run_expert_analysis("CHART", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(orch.expert_report(), "分析失败: X");
    assert!(!orch.is_loading(Mode::Expert));
    assert_eq!(
        orch.mode_state(Mode::Expert),
        ModeState::Failed("分析失败: X".into())
    );
}

#[tokio::test]
async fn test_rerun_clears_previous_report() {
    let transport = ScriptedTransport::new(vec![
        Script::Tokens(vec!["第一次"]),
        Script::Tokens(vec!["第二次"]),
    ]);
    let orch = orchestrator(transport);

    orch.run_expert_analysis("A", &CancellationToken::new()).await.unwrap();
    orch.run_expert_analysis("B", &CancellationToken::new()).await.unwrap();
    assert_eq!(orch.expert_report(), "第二次");
}

#[tokio::test]
async fn test_concurrent_expert_call_is_busy() {
    let gate = Arc::new(Notify::new());
    let transport = ScriptedTransport::gated(vec![Script::Tokens(vec!["ok"])], gate.clone());
    let orch = orchestrator(transport.clone());
    let cancel = CancellationToken::new();

    let (first, second, _) = tokio::join!(
        orch.run_expert_analysis("CHART", &cancel),
        async {
            assert!(orch.is_loading(Mode::Expert));
            orch.run_expert_analysis("CHART", &cancel).await
        },
        async { gate.notify_one() },
    );

    first.unwrap();
    assert!(second.unwrap_err().is_busy());
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(orch.expert_report(), "ok");
}

#[tokio::test]
async fn test_chat_turns_grow_log_by_two() {
    let transport = ScriptedTransport::new(vec![
        Script::Tokens(vec!["财运", "平稳"]),
        Script::Tokens(vec!["有变动"]),
    ]);
    let orch = orchestrator(transport.clone());
    let cancel = CancellationToken::new();

    orch.send_message("CHART", "分析我未来三年的财运", &cancel)
        .await
        .unwrap();
    let session = orch.session();
    assert_eq!(session.chat_log.len(), 2);
    assert_eq!(session.chat_log[1].role, MessageRole::Assistant);
    assert_eq!(session.chat_log[1].content, "财运平稳");

    orch.send_message("CHART", "今年工作有变动吗？", &cancel)
        .await
        .unwrap();
    let session = orch.session();
    assert_eq!(session.chat_log.len(), 4);
    assert!(session.chat_alternates());
    assert_eq!(session.chat_log[3].content, "有变动");

    let requests = transport.requests();
    let (endpoint, second) = &requests[1];
    assert_eq!(
        endpoint.url,
        "https://open.bigmodel.cn/api/paas/v4/chat/completions"
    );
    assert_eq!(second.model, "glm-4-plus");
    assert_eq!(second.temperature, None);
    assert_eq!(second.max_tokens, Some(4096));

    let roles: Vec<_> = second.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(
        roles,
        ["system", "system", "user", "user", "assistant", "user"]
    );
    assert_eq!(second.messages[1].content, "当前时间为2024/5/3");
    assert_eq!(second.messages[2].content, "这是我的命盘数据：\nCHART");
    assert_eq!(second.messages[3].content, "分析我未来三年的财运");
    assert_eq!(second.messages[4].content, "财运平稳");
    assert_eq!(second.messages[5].content, "今年工作有变动吗？");
}

#[tokio::test]
async fn test_chat_carries_prior_report() {
    let transport = ScriptedTransport::new(vec![
        Script::Tokens(vec!["报告"]),
        Script::Tokens(vec!["答"]),
    ]);
    let orch = orchestrator(transport.clone());
    let cancel = CancellationToken::new();

    orch.run_expert_analysis("CHART", &cancel).await.unwrap();
    orch.send_message("CHART", "问", &cancel).await.unwrap();

    let requests = transport.requests();
    assert_eq!(
        requests[1].1.messages[2].content,
        "这是我的命盘数据：\nCHART\n\n此前的专家深度分析报告：\n报告"
    );
}

#[tokio::test]
async fn test_chat_failure_replaces_reply() {
    let transport = ScriptedTransport::new(vec![Script::Fail(
        vec!["半句"],
        ZiweiError::http(401, Some("bad key".into())),
    )]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orch = orchestrator(transport).with_events(tx);

    orch.send_message("CHART", "问", &CancellationToken::new())
        .await
        .unwrap();

    let session = orch.session();
    assert_eq!(session.chat_log.len(), 2);
    assert_eq!(session.chat_log[1].content, "连接异常: bad key");
    assert!(session.chat_alternates());
    assert!(!orch.is_loading(Mode::Chat));

    let last = std::iter::from_fn(|| rx.try_recv().ok()).last();
    assert_eq!(last, Some(SessionEvent::ChatFailed("连接异常: bad key".into())));
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let transport = ScriptedTransport::new(vec![]);
    let orch = orchestrator(transport.clone());

    let err = orch
        .send_message("CHART", "   \n", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_input_validation());
    assert!(orch.session().chat_log.is_empty());
    assert!(transport.requests().is_empty());
    assert_eq!(orch.mode_state(Mode::Chat), ModeState::Idle);
}

#[tokio::test]
async fn test_cancel_keeps_partial_reply() {
    let transport = ScriptedTransport::new(vec![Script::UntilCancelled(vec!["部分"])]);
    let orch = orchestrator(transport);
    let cancel = CancellationToken::new();

    let (result, _) = tokio::join!(orch.send_message("CHART", "问", &cancel), async {
        cancel.cancel()
    });
    result.unwrap();

    let session = orch.session();
    assert_eq!(session.chat_log[1].content, "部分");
    assert!(!orch.is_loading(Mode::Chat));
    assert_eq!(
        orch.mode_state(Mode::Chat),
        ModeState::Failed("连接异常: request aborted".into())
    );
}

#[tokio::test]
async fn test_cancel_before_any_token_writes_failure() {
    let transport = ScriptedTransport::new(vec![Script::UntilCancelled(vec![])]);
    let orch = orchestrator(transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    orch.run_expert_analysis("CHART", &cancel).await.unwrap();
    assert_eq!(orch.expert_report(), "分析失败: request aborted");
}

#[tokio::test]
async fn test_existing_session_survives_new_chart() {
    let mut session = SessionState::new();
    session.expert_report = "旧报告".into();
    session.begin_chat_turn("旧问题");
    session.append_to_reply("旧回答");

    let transport = ScriptedTransport::new(vec![Script::Tokens(vec!["新回答"])]);
    let orch = orchestrator(transport.clone()).with_session(session);

    orch.send_message("NEW CHART", "新问题", &CancellationToken::new())
        .await
        .unwrap();

    let session = orch.session();
    assert_eq!(session.expert_report, "旧报告");
    assert_eq!(session.chat_log.len(), 4);
    assert_eq!(session.chat_log[0].content, "旧问题");

    let requests = transport.requests();
    let request = &requests[0].1;
    assert!(request.messages[2].content.starts_with("这是我的命盘数据：\nNEW CHART"));
    assert!(request.messages[2].content.ends_with("旧报告"));
}
