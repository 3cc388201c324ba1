//! Server-sent-event decoding for streamed chat completions.

use serde::Deserialize;
use tracing::warn;

use crate::error::GuideError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    /// `data: [DONE]` terminator.
    Done,
}

/// Longest partial line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental SSE decoder.
///
/// Network chunks may split lines (and UTF-8 sequences) anywhere; bytes are
/// buffered until a full line arrives. `data:` lines of one event are joined
/// with `\n` and the event is emitted at the blank line that ends it.
///
/// A partial line longer than `MAX_LINE_BYTES` is dropped along with the rest
/// of that line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Option<String>,
    skipping_line: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if self.skipping_line {
                self.skipping_line = false;
            } else {
                let line = String::from_utf8_lossy(&self.buf[start..end]);
                handle_line(&mut self.data, line.trim_end_matches('\r'), &mut out);
            }
            start = end + 1;
        }
        self.buf.drain(..start);

        if self.buf.len() > MAX_LINE_BYTES {
            warn!("dropping SSE line longer than {MAX_LINE_BYTES} bytes");
            self.buf.clear();
            self.skipping_line = true;
        }
        out
    }

    /// Flushes a trailing line and any event left open when the body ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut out = Vec::new();
        let raw = std::mem::take(&mut self.buf);
        if !raw.is_empty() && !self.skipping_line {
            let line = String::from_utf8_lossy(&raw);
            handle_line(&mut self.data, line.trim_end_matches('\r'), &mut out);
        }
        self.skipping_line = false;
        handle_line(&mut self.data, "", &mut out);
        out
    }
}

fn handle_line(data: &mut Option<String>, line: &str, out: &mut Vec<SseEvent>) {
    if line.is_empty() {
        if let Some(data) = data.take() {
            if data == "[DONE]" {
                out.push(SseEvent::Done);
            } else {
                out.push(SseEvent::Data(data));
            }
        }
        return;
    }
    // Comments and non-data fields (event:, id:, retry:) carry nothing we use.
    let Some(value) = line.strip_prefix("data:") else {
        return;
    };
    let value = value.strip_prefix(' ').unwrap_or(value);
    match data.as_mut() {
        Some(data) => {
            data.push('\n');
            data.push_str(value);
        }
        None => *data = Some(value.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) message: String,
}

/// Text carried by one streamed completion chunk, if any.
///
/// Role-only and empty deltas yield `Ok(None)`.
pub fn parse_delta(data: &str) -> Result<Option<String>, GuideError> {
    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| GuideError::Decode(e.to_string()))?;
    if let Some(err) = chunk.error {
        return Err(GuideError::Api(err.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::{MAX_LINE_BYTES, SseDecoder, SseEvent, parse_delta};
    use crate::error::GuideError;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_events_split_across_chunks() {
        let mut d = SseDecoder::new();
        let mut events = d.push(b"data: {\"a\"");
        assert!(events.is_empty());
        events.extend(d.push(b":1}\r\n\r\ndata: [DO"));
        events.extend(d.push(b"NE]\n\n"));
        assert_eq!(
            events,
            vec![SseEvent::Data("{\"a\":1}".to_string()), SseEvent::Done]
        );
    }

    #[test]
    fn joins_multi_line_data_and_skips_comments() {
        let mut d = SseDecoder::new();
        let events = d.push(b": keep-alive\n\nevent: message\ndata: one\ndata:two\n\n");
        assert_eq!(events, vec![SseEvent::Data("one\ntwo".to_string())]);
    }

    #[test]
    fn utf8_split_mid_character() {
        let text = "data: caf\u{e9}\n\n".as_bytes();
        let split = text.len() - 3;
        let mut d = SseDecoder::new();
        let mut events = d.push(&text[..split]);
        events.extend(d.push(&text[split..]));
        assert_eq!(events, vec![SseEvent::Data("caf\u{e9}".to_string())]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"data: tail").is_empty());
        assert_eq!(d.finish(), vec![SseEvent::Data("tail".to_string())]);
        assert!(d.finish().is_empty());
    }

    #[test]
    fn many_events_in_one_chunk() {
        let mut chunk = String::new();
        for i in 0..500 {
            chunk.push_str(&format!("data: {i}\n\n"));
        }
        let events = SseDecoder::new().push(chunk.as_bytes());
        assert_eq!(events.len(), 500);
        assert_eq!(events[499], SseEvent::Data("499".to_string()));
    }

    #[test]
    fn oversized_partial_line_is_dropped() {
        let mut d = SseDecoder::new();
        let junk = vec![b'x'; MAX_LINE_BYTES / 2 + 1];
        assert!(d.push(&junk).is_empty());
        assert!(d.push(&junk).is_empty());
        assert!(d.buf.is_empty());

        // The tail of the dropped line is skipped, later events still decode.
        let events = d.push(b"xxxx\ndata: ok\n\n");
        assert_eq!(events, vec![SseEvent::Data("ok".to_string())]);
    }

    #[test]
    fn parse_delta_extracts_content() {
        let chunk = r#"{"choices":[{"index":0,"delta":{"content":"Hola"}}]}"#;
        assert_eq!(parse_delta(chunk).expect("delta"), Some("Hola".to_string()));

        let role_only = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_delta(role_only).expect("delta"), None);

        let finish = r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_delta(finish).expect("delta"), None);
    }

    #[test]
    fn parse_delta_surfaces_api_errors() {
        let err = parse_delta(r#"{"error":{"message":"rate limited"}}"#).expect_err("api error");
        assert!(matches!(err, GuideError::Api(m) if m == "rate limited"));
        assert!(matches!(parse_delta("nope"), Err(GuideError::Decode(_))));
    }
}
