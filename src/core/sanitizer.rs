//! Stream sanitizer for AI-formatted documents.
//!
//! The formatting backend streams raw model output. Before the document
//! proper begins, that output usually contains reasoning wrapped in
//! `<think>…</think>` and free-form preamble. The sanitizer turns the raw
//! byte stream into clean document increments:
//!
//! - bytes are decoded incrementally as UTF-8;
//! - reasoning blocks are removed from every decoded chunk;
//! - while *seeking*, chunks are discarded until one contains a structural
//!   marker (`<!DOCTYPE`, `<html`, `<head`, `<body`, `<div`, `<section`,
//!   `<h1`..`<h6`, case-insensitive), and everything before the marker is
//!   dropped;
//! - once *streaming*, every cleaned chunk is appended to the document.
//!
//! Cleaning and marker detection work on one chunk at a time. A reasoning
//! block or a marker split across two chunks is not recognized.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::decode::Utf8Decoder;
use crate::error::DocstreamError;

/// Reasoning block, shortest match, spanning newlines.
static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("reasoning pattern"));

/// Opening of the first structural element.
static STRUCTURAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:!DOCTYPE|html|head|body|div|section|h[1-6])").expect("marker pattern")
});

/// Remove every complete reasoning block from `text`.
#[must_use]
pub fn strip_reasoning(text: &str) -> Cow<'_, str> {
    REASONING_BLOCK.replace_all(text, "")
}

/// Byte offset of the first structural marker in `text`.
#[must_use]
pub fn find_structural_marker(text: &str) -> Option<usize> {
    STRUCTURAL_MARKER.find(text).map(|m| m.start())
}

/// Sanitizer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizerState {
    /// No structural marker seen yet; chunks are discarded.
    Seeking,
    /// Document started; chunks are forwarded.
    Streaming,
}

impl fmt::Display for SanitizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeking => write!(f, "seeking"),
            Self::Streaming => write!(f, "streaming"),
        }
    }
}

/// Per-stream sanitizer. One instance per response body.
#[derive(Debug)]
pub struct StreamSanitizer {
    decoder: Utf8Decoder,
    state: SanitizerState,
    emitted: String,
    chunks_seen: usize,
    bytes_seen: usize,
    chunks_discarded: usize,
}

impl Default for StreamSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSanitizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            state: SanitizerState::Seeking,
            emitted: String::new(),
            chunks_seen: 0,
            bytes_seen: 0,
            chunks_discarded: 0,
        }
    }

    /// Feed one raw chunk. Returns the newly emitted text, if any.
    ///
    /// The returned increment is always a suffix of [`Self::emitted`] and
    /// is never empty.
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.chunks_seen += 1;
        self.bytes_seen += chunk.len();

        let decoded = self.decoder.decode(chunk);
        let cleaned = strip_reasoning(&decoded);

        let increment: &str = match self.state {
            SanitizerState::Seeking => {
                let Some(start) = find_structural_marker(&cleaned) else {
                    self.chunks_discarded += 1;
                    tracing::trace!(
                        chunk = self.chunks_seen,
                        bytes = cleaned.len(),
                        "No document marker yet; discarding chunk"
                    );
                    return None;
                };
                self.state = SanitizerState::Streaming;
                tracing::debug!(
                    chunk = self.chunks_seen,
                    discarded_chunks = self.chunks_discarded,
                    "Document marker found"
                );
                &(*cleaned)[start..]
            }
            SanitizerState::Streaming => &*cleaned,
        };

        if increment.is_empty() {
            return None;
        }
        self.emitted.push_str(increment);
        Some(increment.to_string())
    }

    /// End of stream. Returns the final document.
    ///
    /// Bytes of an incomplete UTF-8 sequence still held by the decoder are
    /// dropped.
    #[must_use]
    pub fn finish(mut self) -> String {
        let dropped = self.decoder.discard_pending();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "Dropping incomplete UTF-8 sequence at end of stream");
        }
        tracing::debug!(
            chunks = self.chunks_seen,
            bytes = self.bytes_seen,
            document_bytes = self.emitted.len(),
            started = self.is_started(),
            "Stream finished"
        );
        self.emitted
    }

    /// Stream failure. The text emitted so far travels with the error.
    #[must_use]
    pub fn fail(self, cause: impl fmt::Display) -> DocstreamError {
        let message = cause.to_string();
        tracing::warn!(
            error = %message,
            chunks = self.chunks_seen,
            document_bytes = self.emitted.len(),
            "Stream failed"
        );
        DocstreamError::Stream {
            message,
            partial: self.emitted,
        }
    }

    /// Everything emitted so far.
    #[must_use]
    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    #[must_use]
    pub const fn state(&self) -> SanitizerState {
        self.state
    }

    /// Whether a structural marker has been seen.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state == SanitizerState::Streaming
    }

    #[must_use]
    pub const fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }

    #[must_use]
    pub const fn bytes_seen(&self) -> usize {
        self.bytes_seen
    }
}
