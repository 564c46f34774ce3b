//! Error rendering for docstream.
//!
//! Plain text with fix suggestions for people, structured JSON for scripts.

use crate::cli::args::OutputFormat;
use crate::error::{DocstreamError, FixSuggestion};

// =============================================================================
// Public API
// =============================================================================

/// Render an error for stderr.
#[must_use]
pub fn render_error(error: &DocstreamError, format: OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Human => render_human(error),
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &DocstreamError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Text Rendering
// =============================================================================

/// Header, fix commands and the explanation of the first suggestion.
fn render_human(error: &DocstreamError) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines = vec![render_simple(error)];

    if let Some(first) = suggestions.first() {
        lines.extend(render_commands(&suggestions));
        if !first.context.is_empty() {
            lines.push(String::new());
            lines.extend(wrap_text(&first.context, 70).into_iter().map(|l| format!("  {l}")));
        }
        if let Some(prevention) = &first.prevention {
            lines.push(format!("  Tip: {prevention}"));
        }
    }

    lines.join("\n")
}

/// One-line form: `Error [DS-A001]: message`.
fn render_simple(error: &DocstreamError) -> String {
    format!("Error [{}]: {}", error.error_code(), error)
}

fn render_commands(suggestions: &[FixSuggestion]) -> Vec<String> {
    suggestions
        .iter()
        .flat_map(|s| s.commands.iter())
        .enumerate()
        .map(|(i, cmd)| {
            if i == 0 {
                format!("Fix: {cmd}")
            } else {
                format!(" Or: {cmd}")
            }
        })
        .collect()
}

// =============================================================================
// JSON Rendering
// =============================================================================

/// JSON representation of an error for machine consumption.
#[derive(serde::Serialize)]
struct ErrorJson {
    error_code: String,
    category: String,
    message: String,
    is_retryable: bool,
    requires_reauth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial_output: Option<String>,
    suggestions: Vec<SuggestionJson>,
}

#[derive(serde::Serialize)]
struct SuggestionJson {
    commands: Vec<String>,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevention: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &DocstreamError) -> Self {
        Self {
            error_code: error.error_code().to_string(),
            category: error.category().to_string(),
            message: error.to_string(),
            is_retryable: error.is_retryable(),
            requires_reauth: error.requires_reauth(),
            partial_output: error.partial_output().map(String::from),
            suggestions: error
                .fix_suggestions()
                .into_iter()
                .map(|s| SuggestionJson {
                    commands: s.commands,
                    context: s.context,
                    prevention: s.prevention,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Simple text wrapping (no external dependency).
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

// =============================================================================
// Tests
// =============================================================================
