use crate::proto::CompletionChunk;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A single classified server-sent event line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Blank separator, comment, keep-alive, non-data field, or an
    /// unparsable or empty payload. Consumed and discarded.
    Ignorable,
    /// The gateway's terminal sentinel (`data: [DONE]`).
    Done,
    /// A content delta for the open assistant message.
    Delta(String),
}

/// Classifies one raw line (already newline-stripped) per the gateway's
/// SSE framing.
///
/// This is a pure function of the line; it holds no state across calls
/// and is safe to call independently per line.
pub fn parse_line(line: &str) -> StreamEvent {
    if line.trim().is_empty() {
        // An event separator.
        return StreamEvent::Ignorable;
    }
    if line.starts_with(':') {
        // A comment or keep-alive.
        return StreamEvent::Ignorable;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        // Other fields are not used by the gateway.
        return StreamEvent::Ignorable;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return StreamEvent::Done;
    }

    let chunk = match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => chunk,
        Err(err) => {
            // A frame that arrived malformed must not abort an
            // otherwise successful stream.
            trace!("dropping malformed event: {err}");
            return StreamEvent::Ignorable;
        }
    };
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content);
    match content {
        Some(content) if !content.is_empty() => StreamEvent::Delta(content),
        _ => StreamEvent::Ignorable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_line() {
        let event = parse_line(
            r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
        );
        assert_eq!(event, StreamEvent::Delta("Hello".to_owned()));
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(parse_line("data: [DONE]"), StreamEvent::Done);
        assert_eq!(parse_line("data: [DONE] "), StreamEvent::Done);
    }

    #[test]
    fn test_ignorable_lines() {
        assert_eq!(parse_line(""), StreamEvent::Ignorable);
        assert_eq!(parse_line("   "), StreamEvent::Ignorable);
        assert_eq!(parse_line(": keep-alive"), StreamEvent::Ignorable);
        assert_eq!(parse_line("event: ping"), StreamEvent::Ignorable);
    }

    #[test]
    fn test_malformed_payload_is_ignorable() {
        assert_eq!(parse_line("data: {invalid json"), StreamEvent::Ignorable);
    }

    #[test]
    fn test_missing_or_empty_content_is_ignorable() {
        assert_eq!(
            parse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            StreamEvent::Ignorable
        );
        assert_eq!(
            parse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            StreamEvent::Ignorable
        );
        assert_eq!(
            parse_line(r#"data: {"choices":[]}"#),
            StreamEvent::Ignorable
        );
    }
}
