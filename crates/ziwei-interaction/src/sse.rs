//! Line framing for `text/event-stream` chat-completion responses.

use serde::Deserialize;

/// Reassembles lines from arbitrarily split network chunks.
///
/// Bytes after the last `\n` are kept until a later chunk terminates them, so
/// neither a `data:` record nor a multi-byte character is ever cut in half.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    residual: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every line it completes, without the
    /// terminator (a trailing `\r` is stripped too).
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.residual.extend_from_slice(chunk);

        let Some(last_newline) = self.residual.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.residual.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.residual, rest);

        // `complete` ends in `\n`; dropping it keeps `split` from yielding a
        // phantom empty line after it.
        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Returns the unterminated tail once the stream has ended.
    pub fn flush(&mut self) -> Option<String> {
        if self.residual.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.residual);
        Some(decode_line(&tail))
    }

    pub fn has_residual(&self) -> bool {
        !self.residual.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// What one line of the stream means to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLine {
    /// `data: [DONE]`
    Done,
    /// A non-empty `choices[0].delta.content`.
    Delta(String),
    /// Blank lines, comments, other fields, role-only deltas and frames that
    /// fail to parse.
    Skip,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

pub fn parse_data_line(line: &str) -> DataLine {
    let Some(payload) = line.strip_prefix("data:") else {
        return DataLine::Skip;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == "[DONE]" {
        return DataLine::Done;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|content| !content.is_empty())
            .map_or(DataLine::Skip, DataLine::Delta),
        Err(e) => {
            tracing::trace!(error = %e, "Dropping unparseable SSE frame");
            DataLine::Skip
        }
    }
}
