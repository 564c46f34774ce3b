//! Streaming response consumption.
//!
//! Drives a byte stream through a [`StreamSanitizer`] and hands every
//! non-empty increment to a [`Renderer`] as soon as it is produced.

use std::io::Write;
use std::pin::pin;
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::core::sanitizer::StreamSanitizer;
use crate::error::Result;

/// Consumer of document increments.
pub trait Renderer {
    /// Called once per non-empty increment, in arrival order.
    ///
    /// # Errors
    ///
    /// A failing renderer aborts the stream.
    fn render(&mut self, increment: &str) -> std::io::Result<()>;

    /// Called once after the stream ended cleanly.
    ///
    /// # Errors
    ///
    /// Propagated to the caller of [`consume`].
    fn complete(&mut self, _document: &str) -> std::io::Result<()> {
        Ok(())
    }
}

impl Renderer for Vec<String> {
    fn render(&mut self, increment: &str) -> std::io::Result<()> {
        self.push(increment.to_string());
        Ok(())
    }
}

/// Writes increments straight to a writer, flushing after each one.
#[derive(Debug)]
pub struct WriterRenderer<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> WriterRenderer<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for WriterRenderer<W> {
    fn render(&mut self, increment: &str) -> std::io::Result<()> {
        self.writer.write_all(increment.as_bytes())?;
        self.writer.flush()?;
        self.written += increment.len();
        Ok(())
    }

    fn complete(&mut self, document: &str) -> std::io::Result<()> {
        if !document.is_empty() && !document.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}

/// Discards increments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _increment: &str) -> std::io::Result<()> {
        Ok(())
    }
}

/// Result of a completed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Sanitized document.
    pub document: String,
    /// Raw bytes received.
    pub bytes_received: usize,
    /// Raw chunks received, empty ones included.
    pub chunks_received: usize,
    /// Whether a structural marker was found.
    pub started: bool,
}

/// Consume `stream` to the end.
///
/// With `idle_timeout` set, a gap longer than the timeout between two
/// chunks fails the stream.
///
/// # Errors
///
/// Returns [`crate::DocstreamError::Stream`] carrying the text emitted
/// before the failure when the stream yields an error or stalls, and
/// [`crate::DocstreamError::Io`] when the renderer fails.
pub async fn consume<S, B, E, R>(
    stream: S,
    renderer: &mut R,
    idle_timeout: Option<Duration>,
) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    R: Renderer + ?Sized,
{
    let mut stream = pin!(stream);
    let mut sanitizer = StreamSanitizer::new();

    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    return Err(sanitizer.fail(format!(
                        "no data received for {} seconds",
                        limit.as_secs()
                    )));
                }
            },
            None => stream.next().await,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(sanitizer.fail(e)),
            None => break,
        };

        if let Some(increment) = sanitizer.push(chunk.as_ref()) {
            renderer.render(&increment)?;
        }
    }

    let bytes_received = sanitizer.bytes_seen();
    let chunks_received = sanitizer.chunks_seen();
    let started = sanitizer.is_started();
    let document = sanitizer.finish();
    renderer.complete(&document)?;

    Ok(StreamOutcome {
        document,
        bytes_received,
        chunks_received,
        started,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocstreamError;
    use futures::stream;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::result::Result<&'static [u8], String>> {
        stream::iter(parts.iter().map(|p| Ok::<_, String>(p.as_bytes())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn renders_increments_in_order() {
        let mut rendered: Vec<String> = Vec::new();
        let outcome = consume(
            chunks(&["<think>plan</think>", "ok <div>a", "b</div>"]),
            &mut rendered,
            None,
        )
        .await
        .unwrap();

        assert_eq!(rendered, vec!["<div>a", "b</div>"]);
        assert_eq!(outcome.document, "<div>ab</div>");
        assert_eq!(outcome.chunks_received, 3);
        assert!(outcome.started);
    }

    #[tokio::test]
    async fn error_keeps_partial() {
        let parts: Vec<std::result::Result<&[u8], String>> = vec![
            Ok(b"<div>first".as_slice()),
            Err("connection reset".to_string()),
            Ok(b"never".as_slice()),
        ];
        let mut rendered: Vec<String> = Vec::new();
        let err = consume(stream::iter(parts), &mut rendered, None)
            .await
            .unwrap_err();

        assert_eq!(err.partial_output(), Some("<div>first"));
        assert_eq!(rendered, vec!["<div>first"]);
    }

    #[tokio::test]
    async fn idle_timeout_fails_stream() {
        let head = stream::iter(vec![Ok::<_, String>(b"<div>x".as_slice())]);
        let stalled = head.chain(stream::pending());
        let mut rendered: Vec<String> = Vec::new();

        let err = consume(stalled, &mut rendered, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        match err {
            DocstreamError::Stream { message, partial } => {
                assert!(message.contains("no data"));
                assert_eq!(partial, "<div>x");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn writer_renderer_appends_newline() {
        let mut renderer = WriterRenderer::new(Vec::new());
        consume(chunks(&["<h1>T</h1>"]), &mut renderer, None)
            .await
            .unwrap();
        assert_eq!(renderer.written(), 10);
        assert_eq!(renderer.into_inner(), b"<h1>T</h1>\n");
    }

    #[tokio::test]
    async fn empty_stream_reports_zero_bytes() {
        let outcome = consume(chunks(&[]), &mut NullRenderer, None).await.unwrap();
        assert_eq!(outcome.bytes_received, 0);
        assert!(outcome.document.is_empty());
        assert!(!outcome.started);
    }
}
