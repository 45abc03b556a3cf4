//! Server-sent event decoding.
//!
//! A streaming response body is split into lines, each line is classified by
//! its SSE field, and `data:` payloads are parsed as JSON into the caller's
//! message type. Decoding runs on its own task and hands messages over a
//! bounded channel, exposed to the caller as an [`SseStream`].

mod line;
mod stream;

pub use line::{LineSplitter, SseField, SseLine, parse_line};
pub use stream::SseStream;
