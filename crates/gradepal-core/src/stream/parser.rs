//! Incremental parser for the framed chat stream.

use gradepal_types::error::ConsumerError;
use gradepal_types::stream::{DONE_SENTINEL, StreamFrame};

/// One recovered stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    Frame(StreamFrame),
    /// The literal `[DONE]` sentinel.
    Terminator,
}

/// Splits arbitrary byte chunks into stream events.
///
/// Bytes after the last newline are carried into the next `push`, so a line
/// or a multi-byte UTF-8 sequence split across two reads is reassembled
/// before decoding.
#[derive(Debug, Default)]
pub struct FrameParser {
    carry: Vec<u8>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every complete event it finishes.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<ParsedEvent>, ConsumerError> {
        self.carry.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.carry[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(event) = parse_line(&self.carry[start..end])? {
                events.push(event);
            }
            start = end + 1;
        }
        self.carry.drain(..start);
        Ok(events)
    }

    /// Flush a final line that had no trailing newline.
    pub fn finish(&mut self) -> Result<Option<ParsedEvent>, ConsumerError> {
        let rest = std::mem::take(&mut self.carry);
        parse_line(&rest)
    }

    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }
}

fn parse_line(raw: &[u8]) -> Result<Option<ParsedEvent>, ConsumerError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = std::str::from_utf8(raw).map_err(|e| ConsumerError::Parse(e.to_string()))?;

    // Blank separators, comments and other fields carry no event.
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() {
        return Ok(None);
    }
    if payload.trim() == DONE_SENTINEL {
        return Ok(Some(ParsedEvent::Terminator));
    }

    serde_json::from_str::<StreamFrame>(payload)
        .map(|frame| Some(ParsedEvent::Frame(frame)))
        .map_err(|e| ConsumerError::Parse(format!("{e}: {payload}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn wire(thread_id: Uuid) -> String {
        format!(
            ": connected\n\ndata: {{\"chunk\":\"Hé\"}}\n\ndata: {{\"chunk\":\"llo\"}}\n\ndata: {{\"threadId\":\"{thread_id}\",\"done\":true}}\n\ndata: [DONE]\n\n"
        )
    }

    fn expected(thread_id: Uuid) -> Vec<ParsedEvent> {
        vec![
            ParsedEvent::Frame(StreamFrame::chunk("Hé")),
            ParsedEvent::Frame(StreamFrame::chunk("llo")),
            ParsedEvent::Frame(StreamFrame::done(thread_id)),
            ParsedEvent::Terminator,
        ]
    }

    #[test]
    fn test_whole_body_in_one_read() {
        let id = Uuid::now_v7();
        let mut parser = FrameParser::new();
        assert_eq!(parser.push(wire(id).as_bytes()).unwrap(), expected(id));
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_split_at_every_byte_boundary() {
        let id = Uuid::now_v7();
        let body = wire(id).into_bytes();
        for split in 0..=body.len() {
            let mut parser = FrameParser::new();
            let mut events = parser.push(&body[..split]).unwrap();
            events.extend(parser.push(&body[split..]).unwrap());
            assert_eq!(events, expected(id), "split at {split}");
        }
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let id = Uuid::now_v7();
        let mut parser = FrameParser::new();
        let mut events = Vec::new();
        for byte in wire(id).as_bytes() {
            events.extend(parser.push(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(events, expected(id));
    }

    #[test]
    fn test_crlf_and_unspaced_prefix() {
        let mut parser = FrameParser::new();
        let events = parser
            .push(b"data:{\"chunk\":\"a\"}\r\n\r\nevent: ping\r\ndata: [DONE]\r\n\r\n")
            .unwrap();
        assert_eq!(
            events,
            vec![ParsedEvent::Frame(StreamFrame::chunk("a")), ParsedEvent::Terminator]
        );
    }

    #[test]
    fn test_trailing_line_without_newline_is_flushed() {
        let mut parser = FrameParser::new();
        assert!(parser.push(b"data: [DONE]").unwrap().is_empty());
        assert_eq!(parser.finish().unwrap(), Some(ParsedEvent::Terminator));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let mut parser = FrameParser::new();
        let err = parser.push(b"data: {not json}\n\n").unwrap_err();
        assert!(matches!(err, ConsumerError::Parse(_)));
    }
}
