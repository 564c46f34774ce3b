//! Core client: credentials, request pipeline, refresh and streaming.

pub mod auth;
pub mod credentials;
pub mod decode;
pub mod document;
pub mod format;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod refresh;
pub mod sanitizer;
pub mod stream;

pub use auth::{AuthClient, AuthPaths, LogoutOutcome};
pub use credentials::{CredentialStore, SessionBackend, SessionStore};
pub use document::FormattedDocument;
pub use format::{FormatClient, MIN_INPUT_CHARS};
pub use models::{CredentialPair, FormattingMode, Identity, Session};
pub use pipeline::{ApiRequest, PendingRequest, RequestBody, RequestPipeline};
pub use refresh::RefreshProtocol;
pub use sanitizer::{SanitizerState, StreamSanitizer};
pub use stream::{NullRenderer, Renderer, StreamOutcome, WriterRenderer, consume};
