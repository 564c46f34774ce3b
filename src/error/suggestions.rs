//! Fix suggestions for docstream errors.
//!
//! Maps error variants to copy-paste commands and a short explanation.

use super::{DocstreamError, RefreshFailure, UnauthorizedReason};

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Primary fix commands in order of preference.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

fn login_again(context: impl Into<String>) -> FixSuggestion {
    FixSuggestion::new(
        vec!["docstream login --email <you@example.com>".to_string()],
        context,
    )
}

pub(super) fn for_error(err: &DocstreamError) -> Vec<FixSuggestion> {
    match err {
        DocstreamError::Unauthorized { reason, .. } => match reason {
            UnauthorizedReason::RetryExhausted => vec![login_again(
                "The backend rejected the request even with a freshly refreshed token.",
            )],
            UnauthorizedReason::RefreshFailed(failure) => refresh_failed(failure),
        },
        DocstreamError::RefreshFailed(failure) => refresh_failed(failure),
        DocstreamError::NotLoggedIn => vec![login_again("No session is stored.")],
        DocstreamError::LoginRejected { .. } => vec![
            FixSuggestion::new(
                vec!["docstream login --email <you@example.com>".to_string()],
                "Check the email and password. Unverified accounts cannot log in.",
            ),
        ],
        DocstreamError::Timeout(seconds) => vec![
            FixSuggestion::new(
                vec![format!("docstream --timeout {} <command>", seconds.saturating_mul(2))],
                format!("The backend did not answer within {seconds} seconds."),
            ),
        ],
        DocstreamError::Network(_) | DocstreamError::Http { .. } => vec![
            FixSuggestion::new(
                vec!["docstream config show".to_string()],
                "Check that the configured base URL points at a running backend.",
            ),
        ],
        DocstreamError::Stream { partial, .. } => {
            let context = if partial.is_empty() {
                "The stream failed before any document content arrived.".to_string()
            } else {
                format!(
                    "The stream failed after {} characters; the partial document was kept.",
                    partial.chars().count()
                )
            };
            vec![FixSuggestion::new(
                vec!["docstream format --mode <mode> --input <file>".to_string()],
                context,
            )]
        }
        DocstreamError::EmptyBody { .. } => vec![FixSuggestion::new(
            vec!["docstream format --mode <mode> --input <file>".to_string()],
            "The backend accepted the request but returned no content.",
        )],
        DocstreamError::InvalidMode(_) => vec![FixSuggestion::new(
            vec!["docstream format --mode paper".to_string()],
            "Valid modes: paper, proposal, report.",
        )],
        DocstreamError::InputTooShort { min, .. } => vec![FixSuggestion::new(
            Vec::new(),
            format!("Provide at least {min} characters of input."),
        )],
        DocstreamError::Config(_) => vec![FixSuggestion::new(
            vec!["docstream config path".to_string()],
            "Fix or remove the config file.",
        )],
        DocstreamError::Keyring(_) => vec![
            FixSuggestion::new(
                vec!["docstream --session-backend file login --email <you@example.com>".to_string()],
                "The OS keyring is unavailable.",
            )
            .with_prevention("Set `backend = \"file\"` under [session] in config.toml."),
        ],
        DocstreamError::ParseResponse(_)
        | DocstreamError::Io(_)
        | DocstreamError::Json(_)
        | DocstreamError::Other(_) => Vec::new(),
    }
}

fn refresh_failed(failure: &RefreshFailure) -> Vec<FixSuggestion> {
    let context = match failure {
        RefreshFailure::MissingRefreshToken => "The session has no refresh token.",
        RefreshFailure::Transport(_) => "The token refresh endpoint could not be reached.",
        RefreshFailure::Rejected { .. } => "The refresh token was rejected or has expired.",
        RefreshFailure::Malformed(_) => "The token refresh endpoint returned an unexpected body.",
    };
    vec![
        login_again(context)
            .with_prevention("Credentials are cleared whenever a refresh fails."),
    ]
}
