//! Storage for configuration and the persisted session.

pub mod config;
pub mod paths;
pub mod session;

pub use config::{
    Config, ConfigOverrides, ConfigSource, ConfigSources, ResolvedConfig, SessionBackendKind,
    ENV_BASE_URL, ENV_CONFIG, ENV_SESSION_BACKEND, ENV_TIMEOUT,
};
pub use paths::AppPaths;
pub use session::{FileSessionBackend, KeyringSessionBackend, open_store};
