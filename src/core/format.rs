//! AI formatting client.
//!
//! Submits source text for formatting and streams the sanitized document
//! back through a [`Renderer`].

use std::time::Duration;

use crate::core::document::FormattedDocument;
use crate::core::models::FormattingMode;
use crate::core::pipeline::{ApiRequest, RequestPipeline};
use crate::core::stream::{Renderer, consume};
use crate::error::{DocstreamError, Result};

/// Minimum accepted input length, in characters.
pub const MIN_INPUT_CHARS: usize = 200;

/// Default path of the formatting endpoint, relative to the API base.
pub const DEFAULT_FORMAT_PATH: &str = "/papers/ai-format/";

/// Default gap allowed between two streamed chunks.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Reject input that is too short to format.
///
/// # Errors
///
/// Returns [`DocstreamError::InputTooShort`].
pub fn validate_input(content: &str) -> Result<()> {
    let chars = content.trim().chars().count();
    if chars < MIN_INPUT_CHARS {
        return Err(DocstreamError::InputTooShort {
            chars,
            min: MIN_INPUT_CHARS,
        });
    }
    Ok(())
}

/// Client for the streaming formatting endpoint.
#[derive(Clone)]
pub struct FormatClient {
    pipeline: RequestPipeline,
    target: String,
    idle_timeout: Option<Duration>,
}

impl FormatClient {
    #[must_use]
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            pipeline,
            target: DEFAULT_FORMAT_PATH.to_string(),
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// `None` waits indefinitely between chunks.
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Format `content` in `mode`, rendering increments as they arrive.
    ///
    /// # Errors
    ///
    /// - [`DocstreamError::InputTooShort`] before any request is made
    /// - [`DocstreamError::Unauthorized`] when the session cannot be recovered
    /// - [`DocstreamError::Http`] for other non-2xx statuses
    /// - [`DocstreamError::Stream`] when the body fails mid-stream
    /// - [`DocstreamError::EmptyBody`] when the body has no bytes at all
    pub async fn format<R>(
        &self,
        mode: FormattingMode,
        content: &str,
        renderer: &mut R,
    ) -> Result<FormattedDocument>
    where
        R: Renderer + ?Sized,
    {
        validate_input(content)?;

        tracing::info!(
            %mode,
            chars = content.chars().count(),
            target = %self.target,
            "Submitting document for formatting"
        );

        let request = ApiRequest::post(&self.target)
            .multipart([("mode", mode.as_str()), ("input_content", content)])
            .streaming();
        let response = self.pipeline.send_ok(request).await?;

        let outcome = consume(response.bytes_stream(), renderer, self.idle_timeout).await?;
        if outcome.bytes_received == 0 {
            return Err(DocstreamError::EmptyBody {
                target: self.target.clone(),
            });
        }
        if !outcome.started {
            tracing::warn!(
                bytes = outcome.bytes_received,
                "Stream ended without a document marker"
            );
        }

        Ok(FormattedDocument::new(mode, outcome.document))
    }
}
