//! Line splitting and field classification.

use bytes::BytesMut;

/// The SSE fields this client recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseField {
    Data,
    Event,
    Id,
    Retry,
}

impl SseField {
    const ALL: [(&'static str, SseField); 4] = [
        ("data:", SseField::Data),
        ("event:", SseField::Event),
        ("id:", SseField::Id),
        ("retry:", SseField::Retry),
    ];
}

/// One classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SseLine<'a> {
    pub field: SseField,
    pub value: &'a str,
}

/// Classify a line by its field prefix.
///
/// A single space after the colon is part of the separator and is stripped.
/// Comments, blank lines and unknown fields yield `None`.
///
/// ```
/// use dify::sse::{parse_line, SseField};
///
/// let line = parse_line("data: {\"text\":\"hi\"}").unwrap();
/// assert_eq!(line.field, SseField::Data);
/// assert_eq!(line.value, "{\"text\":\"hi\"}");
/// assert!(parse_line(": keep-alive").is_none());
/// ```
pub fn parse_line(line: &str) -> Option<SseLine<'_>> {
    SseField::ALL.iter().find_map(|(prefix, field)| {
        line.strip_prefix(prefix).map(|rest| SseLine {
            field: *field,
            value: rest.strip_prefix(' ').unwrap_or(rest),
        })
    })
}

/// Reassembles lines from arbitrarily chunked bytes.
///
/// Lines end at `\n`; a trailing `\r` is dropped. Bytes are kept until the
/// line is complete, so a multi-byte character split between two chunks is
/// decoded intact.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: BytesMut,
    scanned: usize,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of the body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete line, if one is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let offset = self.buffer[self.scanned..]
            .iter()
            .position(|b| *b == b'\n');

        match offset {
            Some(offset) => {
                let end = self.scanned + offset;
                let raw = self.buffer.split_to(end + 1);
                self.scanned = 0;
                Some(decode(&raw[..end]))
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Take whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let raw = self.buffer.split();
        Some(decode(&raw))
    }
}

fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(splitter: &mut LineSplitter) -> Vec<String> {
        std::iter::from_fn(|| splitter.next_line()).collect()
    }

    #[test]
    fn classifies_known_fields() {
        assert_eq!(parse_line("event: ping").unwrap().field, SseField::Event);
        assert_eq!(parse_line("id: 42").unwrap().value, "42");
        assert_eq!(parse_line("retry: 3000").unwrap().field, SseField::Retry);
        assert_eq!(parse_line("data:{\"a\":1}").unwrap().value, "{\"a\":1}");
    }

    #[test]
    fn only_one_separator_space_is_stripped() {
        assert_eq!(parse_line("data:  x").unwrap().value, " x");
    }

    #[test]
    fn ignores_comments_and_unknown_fields() {
        assert!(parse_line(": ping").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line("foo: bar").is_none());
        assert!(parse_line("database: x").is_none());
    }

    #[test]
    fn splits_lines_across_chunks() {
        let mut splitter = LineSplitter::new();
        splitter.push(b"event: pi");
        assert!(drain(&mut splitter).is_empty());
        splitter.push(b"ng\r\ndata: {\"te");
        assert_eq!(drain(&mut splitter), vec!["event: ping"]);
        splitter.push(b"xt\":\"hi\"}\n\ndata: tail");
        assert_eq!(drain(&mut splitter), vec!["data: {\"text\":\"hi\"}", ""]);
        assert_eq!(splitter.finish().as_deref(), Some("data: tail"));
        assert!(splitter.finish().is_none());
    }

    #[test]
    fn keeps_multibyte_characters_split_between_chunks() {
        let line = "data: {\"text\":\"你好\"}\n".as_bytes();
        let split = line.len() - 5;
        let mut splitter = LineSplitter::new();
        splitter.push(&line[..split]);
        assert!(splitter.next_line().is_none());
        splitter.push(&line[split..]);
        assert_eq!(splitter.next_line().as_deref(), Some("data: {\"text\":\"你好\"}"));
    }
}
