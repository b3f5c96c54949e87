//! Message sequences sent to the two endpoints.

use chrono::NaiveDate;
use ziwei_core::prompt::{
    CHART_CONTEXT_PREFIX, EXPERT_PROMPT, PRIOR_REPORT_PREFIX, chat_system_prompt,
};
use ziwei_core::session::ChatMessage;
use ziwei_interaction::RequestMessage;

/// `[system: expert prompt, user: chart text]`
pub fn expert_messages(chart_text: &str) -> Vec<RequestMessage> {
    vec![
        RequestMessage::system(EXPERT_PROMPT),
        RequestMessage::user(chart_text),
    ]
}

/// Builds the consultation request.
///
/// Order: persona prompt, today's date, the chart (plus any earlier report),
/// the prior log role for role, then the new question. `history` is the log
/// as it was before the new turn was appended.
pub fn consultation_messages(
    chart_text: &str,
    expert_report: &str,
    history: &[ChatMessage],
    user_text: &str,
    today: NaiveDate,
) -> Vec<RequestMessage> {
    let mut chart_context = format!("{CHART_CONTEXT_PREFIX}{chart_text}");
    if !expert_report.is_empty() {
        chart_context.push_str(PRIOR_REPORT_PREFIX);
        chart_context.push_str(expert_report);
    }

    let mut messages = Vec::with_capacity(history.len() + 4);
    messages.push(RequestMessage::system(chat_system_prompt()));
    messages.push(RequestMessage::system(format!(
        "当前时间为{}",
        locale_date(today)
    )));
    messages.push(RequestMessage::user(chart_context));
    messages.extend(history.iter().map(RequestMessage::from));
    messages.push(RequestMessage::user(user_text));
    messages
}

/// `2024/5/3`, the zh-CN short date form.
pub fn locale_date(date: NaiveDate) -> String {
    date.format("%Y/%-m/%-d").to_string()
}
