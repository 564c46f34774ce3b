//! Error types for docstream.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Authentication**: Unauthorized calls that could not be recovered, refresh failures
//! - **Network**: Connection, timeout, or non-auth HTTP failures
//! - **Configuration**: Config file parsing, validation, or bad arguments
//! - **Stream**: Failures while reading a generated document body
//! - **Internal**: I/O, serialization, secret storage, unclassified
//!
//! Each error has a stable error code (e.g., `DS-A001`) for programmatic handling.

pub mod suggestions;

use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credentials missing, expired, or rejected.
    Authentication,
    /// Transport failures and non-auth HTTP errors.
    Network,
    /// Configuration and argument issues.
    Configuration,
    /// Failures while consuming a generation stream.
    Stream,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Stream => "Stream error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Stream => "S",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// The user must log in again
    AuthRequired = 2,
    /// Parse/config/argument errors
    ParseError = 3,
    /// Timeout
    Timeout = 4,
    /// Stream ended in failure (partial output may have been written)
    StreamFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

// =============================================================================
// Auth failure details
// =============================================================================

/// Why an unauthorized response was not recovered locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The call had already been retried once after a refresh.
    RetryExhausted,
    /// The refresh exchange failed; credentials were cleared.
    RefreshFailed(RefreshFailure),
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RetryExhausted => write!(f, "rejected again after token refresh"),
            Self::RefreshFailed(failure) => write!(f, "token refresh failed: {failure}"),
        }
    }
}

/// Failure modes of the token refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// No refresh token was stored; no network call was made.
    #[error("no refresh token available")]
    MissingRefreshToken,
    /// The exchange could not reach the backend.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("rejected with HTTP {status}")]
    Rejected { status: u16 },
    /// The backend answered 2xx but without a usable access token.
    #[error("malformed response: {0}")]
    Malformed(String),
}

// =============================================================================
// Main error type
// =============================================================================

/// Main error type for docstream operations.
///
/// Each variant has:
/// - A stable error code (e.g., `DS-A001`)
/// - A category for classification
/// - An exit code for the CLI
#[derive(Error, Debug)]
pub enum DocstreamError {
    // ==========================================================================
    // Authentication errors (Category: Authentication)
    // ==========================================================================
    /// The backend answered 401 and the call could not be recovered.
    #[error("unauthorized request to {target}: {reason}")]
    Unauthorized {
        target: String,
        reason: UnauthorizedReason,
    },

    /// The refresh exchange failed. Credentials have been cleared.
    #[error("token refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// Login was rejected by the backend.
    #[error("login rejected: {message}")]
    LoginRejected {
        status: u16,
        message: String,
    },

    /// An operation needs credentials but the session is anonymous.
    #[error("not logged in")]
    NotLoggedIn,

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Non-2xx response unrelated to authorization.
    #[error("HTTP {status} from {target}: {body}")]
    Http {
        status: u16,
        target: String,
        body: String,
    },

    /// Request timed out.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Generic transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Success status but the body could not be decoded.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Stream errors (Category: Stream)
    // ==========================================================================
    /// Reading the generation stream failed. `partial` holds the clean
    /// document emitted before the failure.
    #[error("stream failed: {message}")]
    Stream {
        message: String,
        partial: String,
    },

    /// The generation endpoint returned success without a readable body.
    #[error("no content returned from {target}")]
    EmptyBody {
        target: String,
    },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown formatting mode.
    #[error("invalid formatting mode: {0}")]
    InvalidMode(String),

    /// Submission below the minimum length.
    #[error("input too short: {chars} characters (minimum {min})")]
    InputTooShort {
        chars: usize,
        min: usize,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OS secret storage failed.
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocstreamError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Unauthorized { .. }
            | Self::RefreshFailed(_)
            | Self::LoginRejected { .. }
            | Self::NotLoggedIn => ExitCode::AuthRequired,

            Self::Config(_) | Self::InvalidMode(_) | Self::InputTooShort { .. } => {
                ExitCode::ParseError
            }

            Self::Timeout(_) => ExitCode::Timeout,

            Self::Stream { .. } | Self::EmptyBody { .. } => ExitCode::StreamFailed,

            Self::Http { .. }
            | Self::Network(_)
            | Self::ParseResponse(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Keyring(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. }
            | Self::RefreshFailed(_)
            | Self::LoginRejected { .. }
            | Self::NotLoggedIn => ErrorCategory::Authentication,

            Self::Http { .. } | Self::Timeout(_) | Self::Network(_) | Self::ParseResponse(_) => {
                ErrorCategory::Network
            }

            Self::Stream { .. } | Self::EmptyBody { .. } => ErrorCategory::Stream,

            Self::Config(_) | Self::InvalidMode(_) | Self::InputTooShort { .. } => {
                ErrorCategory::Configuration
            }

            Self::Io(_) | Self::Json(_) | Self::Keyring(_) | Self::Other(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `DS-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Authentication errors (A001-A099)
            Self::Unauthorized { .. } => "DS-A001",
            Self::RefreshFailed(_) => "DS-A002",
            Self::LoginRejected { .. } => "DS-A003",
            Self::NotLoggedIn => "DS-A004",

            // Network errors (N001-N099)
            Self::Timeout(_) => "DS-N001",
            Self::Http { .. } => "DS-N002",
            Self::ParseResponse(_) => "DS-N003",
            Self::Network(_) => "DS-N099",

            // Stream errors (S001-S099)
            Self::Stream { .. } => "DS-S001",
            Self::EmptyBody { .. } => "DS-S002",

            // Configuration errors (C001-C099)
            Self::Config(_) => "DS-C001",
            Self::InvalidMode(_) => "DS-C002",
            Self::InputTooShort { .. } => "DS-C003",

            // Internal errors (X001-X099)
            Self::Io(_) => "DS-X001",
            Self::Json(_) => "DS-X002",
            Self::Keyring(_) => "DS-X003",
            Self::Other(_) => "DS-X099",
        }
    }

    /// Whether the caller should route the user back to login.
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(self.category(), ErrorCategory::Authentication)
    }

    /// Whether retrying the whole operation later might succeed.
    ///
    /// Nothing in this crate retries on its own beyond the single
    /// post-refresh retry; this is advisory for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::Stream { .. } => true,
            Self::Http { status, .. } => matches!(*status, 502..=504),
            _ => false,
        }
    }

    /// Partial document preserved by a stream failure, if any.
    #[must_use]
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Self::Stream { partial, .. } if !partial.is_empty() => Some(partial),
            _ => None,
        }
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        suggestions::for_error(self)
    }
}

/// Result type alias for docstream operations.
pub type Result<T> = std::result::Result<T, DocstreamError>;
