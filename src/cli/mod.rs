//! CLI argument parsing and command dispatch.

pub mod account;
pub mod args;
pub mod config;
pub mod format;

use std::sync::Arc;

use crate::core::auth::AuthClient;
use crate::core::credentials::{CredentialStore, SessionStore};
use crate::core::format::FormatClient;
use crate::core::http::build_client;
use crate::core::pipeline::RequestPipeline;
use crate::error::Result;
use crate::storage::{AppPaths, ResolvedConfig, open_store};

pub use args::{Cli, Commands, OutputFormat};

/// Everything a command needs: resolved settings, the session store and a
/// pipeline bound to both.
pub struct AppContext {
    pub config: ResolvedConfig,
    pub paths: AppPaths,
    pub store: Arc<SessionStore>,
    pub pipeline: RequestPipeline,
    pub format: OutputFormat,
    pub pretty: bool,
}

impl AppContext {
    /// Resolve configuration and open the session store.
    ///
    /// # Errors
    ///
    /// Returns configuration errors and HTTP client construction failures.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = ResolvedConfig::resolve(&cli.overrides())?;
        Self::new(config, AppPaths::new(), cli.effective_format(), cli.pretty)
    }

    /// Build a context from already-resolved parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ResolvedConfig,
        paths: AppPaths,
        format: OutputFormat,
        pretty: bool,
    ) -> Result<Self> {
        let store = open_store(config.session_backend, &paths);
        let shared: Arc<dyn CredentialStore> = store.clone();
        let pipeline = RequestPipeline::new(
            build_client()?,
            config.base_url.clone(),
            &config.refresh_path,
            shared,
        )
        .with_timeout(config.timeout);

        tracing::debug!(
            base_url = %config.base_url,
            session = %store.backend_description(),
            "Context ready"
        );

        Ok(Self {
            config,
            paths,
            store,
            pipeline,
            format,
            pretty,
        })
    }

    #[must_use]
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.pipeline.clone()).with_paths(self.config.auth_paths())
    }

    #[must_use]
    pub fn formatter(&self) -> FormatClient {
        FormatClient::new(self.pipeline.clone())
            .with_target(self.config.format_path.clone())
            .with_idle_timeout(self.config.stream_idle_timeout)
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
