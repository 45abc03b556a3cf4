//! Decoder task and the stream handed to callers.

use std::fmt;
use std::pin::{Pin, pin};
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, debug_span, trace};

use crate::Result;
use crate::error::TransportError;

use super::line::{LineSplitter, SseField, parse_line};

/// Decoded messages of one streaming response.
///
/// Messages arrive in wire order. The stream ends when the body ends or
/// fails; a body read failure is delivered as a final `Err` item. Dropping
/// the stream or calling [`cancel`](Self::cancel) stops the decoder task
/// and releases the response body.
pub struct SseStream<T> {
    inner: ReceiverStream<Result<T>>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl<T> SseStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Spawn a decoder over a byte stream.
    ///
    /// At most `capacity` decoded messages are buffered ahead of the
    /// consumer. Must be called from within a Tokio runtime.
    pub fn spawn<S, B, E>(body: S, capacity: usize) -> Self
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();

        tokio::spawn(decode(body, tx, cancel.clone()).instrument(debug_span!("sse_decoder")));

        Self {
            inner: ReceiverStream::new(rx),
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }
}

impl<T> SseStream<T> {
    /// Stop decoding. Messages already buffered can still be read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Receive the next message.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.inner.next().await
    }
}

impl<T> Stream for SseStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl<T> fmt::Debug for SseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

async fn decode<S, B, E, T>(body: S, tx: mpsc::Sender<Result<T>>, cancel: CancellationToken)
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
    T: DeserializeOwned,
{
    let mut body = pin!(body);
    let mut lines = LineSplitter::new();
    let mut delivered = 0usize;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(delivered, "stream cancelled");
                return;
            }
            _ = tx.closed() => {
                debug!(delivered, "consumer dropped");
                return;
            }
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                lines.push(bytes.as_ref());
                while let Some(line) = lines.next_line() {
                    if let Some(message) = decode_line(&line) {
                        if !emit(&tx, &cancel, Ok(message)).await {
                            return;
                        }
                        delivered += 1;
                    }
                }
            }
            Some(Err(e)) => {
                debug!(error = %e, delivered, "stream body failed");
                let error = TransportError::Body {
                    message: e.to_string(),
                };
                emit(&tx, &cancel, Err(error.into())).await;
                return;
            }
            None => {
                if let Some(message) = lines.finish().as_deref().and_then(decode_line::<T>) {
                    if emit(&tx, &cancel, Ok(message)).await {
                        delivered += 1;
                    }
                }
                debug!(delivered, "stream ended");
                return;
            }
        }
    }
}

/// Send one item unless the stream is cancelled first.
async fn emit<T>(tx: &mpsc::Sender<Result<T>>, cancel: &CancellationToken, item: Result<T>) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

fn decode_line<T: DeserializeOwned>(line: &str) -> Option<T> {
    let line = parse_line(line)?;
    match line.field {
        SseField::Data => match serde_json::from_str(line.value) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "skipping malformed data frame");
                None
            }
        },
        other => {
            trace!(field = ?other, "ignoring non-data field");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use bytes::Bytes;
    use futures_util::stream;
    use serde::Deserialize;

    use super::*;
    use crate::error::Error;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Message {
        text: String,
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::result::Result<Bytes, String>> + Send + 'static {
        let parts: Vec<_> = parts
            .iter()
            .copied()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        stream::iter(parts)
    }

    async fn collect(stream: SseStream<Message>) -> Vec<Result<Message>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn yields_only_data_payloads() {
        let body = chunks(&[
            "event: ping\n",
            "data: {\"text\":\"hi\"}\n",
            ": comment\n",
            "data: {\"text\":\"there\"}\n",
        ]);
        let items = collect(SseStream::spawn(body, 4)).await;
        let texts: Vec<_> = items.into_iter().map(|m| m.unwrap().text).collect();
        assert_eq!(texts, vec!["hi", "there"]);
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let body = chunks(&["da", "ta: {\"te", "xt\":\"a\"}\r", "\ndata: {\"text\":\"b\"}"]);
        let items = collect(SseStream::spawn(body, 1)).await;
        let texts: Vec<_> = items.into_iter().map(|m| m.unwrap().text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn skips_malformed_payloads() {
        let body = chunks(&["data: {not json}\n", "data: {\"text\":\"ok\"}\n"]);
        let items = collect(SseStream::spawn(body, 4)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().text, "ok");
    }

    #[tokio::test]
    async fn body_failure_is_the_last_item() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"a\"}\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: {\"text\":\"b\"}\n")),
        ]);
        let items = collect(SseStream::spawn(body, 4)).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "a");
        assert!(matches!(
            items[1],
            Err(Error::Transport(TransportError::Body { .. }))
        ));
    }

    /// A body that never ends and records when it is dropped.
    struct Endless {
        dropped: Arc<AtomicBool>,
    }

    impl Stream for Endless {
        type Item = std::result::Result<Bytes, String>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Pending
        }
    }

    impl Drop for Endless {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    async fn wait_for(flag: &AtomicBool) {
        for _ in 0..100 {
            if flag.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("body was not released");
    }

    #[tokio::test]
    async fn cancel_releases_the_body() {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut stream: SseStream<Message> = SseStream::spawn(
            Endless {
                dropped: dropped.clone(),
            },
            4,
        );

        stream.cancel();
        assert!(stream.is_cancelled());
        wait_for(&dropped).await;
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_body() {
        let dropped = Arc::new(AtomicBool::new(false));
        let stream: SseStream<Message> = SseStream::spawn(
            Endless {
                dropped: dropped.clone(),
            },
            4,
        );

        drop(stream);
        wait_for(&dropped).await;
    }
}
