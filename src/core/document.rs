//! Formatted document produced by a completed stream.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::core::models::FormattingMode;
use crate::error::Result;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>|<script\b[^>]*>.*?</script\s*>")
        .expect("script pattern")
});

static LINE_BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|section|li|tr|h[1-6]|title)\s*>").expect("break pattern")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank pattern"));

/// A completed, sanitized document.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedDocument {
    pub mode: FormattingMode,
    pub html: String,
    pub completed_at: DateTime<Utc>,
}

impl FormattedDocument {
    #[must_use]
    pub fn new(mode: FormattingMode, html: String) -> Self {
        Self {
            mode,
            html,
            completed_at: Utc::now(),
        }
    }

    /// `formatted_<mode>_<unix-millis>.html`
    #[must_use]
    pub fn export_file_name(&self) -> String {
        format!(
            "formatted_{}_{}.html",
            self.mode,
            self.completed_at.timestamp_millis()
        )
    }

    /// Write the HTML into `dir` under [`Self::export_file_name`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.export_file_name());
        std::fs::write(&path, &self.html)?;
        tracing::info!(path = %path.display(), bytes = self.html.len(), "Document saved");
        Ok(path)
    }

    /// Text content with markup removed.
    #[must_use]
    pub fn plain_text(&self) -> String {
        html_to_text(&self.html)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Strip markup from an HTML fragment.
///
/// Script and style contents are dropped, block ends become line breaks,
/// basic entities are decoded and runs of blank lines are collapsed.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_OR_STYLE.replace_all(html, "");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last so that `&amp;lt;` stays `&lt;`.
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
