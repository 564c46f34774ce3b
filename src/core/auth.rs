//! Account operations: login, logout and profile.
//!
//! Login is unauthenticated and goes straight to the HTTP client. Logout and
//! profile are authenticated calls through the [`RequestPipeline`].

use serde::Serialize;
use serde_json::json;

use crate::core::http::{error_message, map_transport_error, read_capped_body};
use crate::core::models::{CredentialPair, Identity, LoginResponse};
use crate::core::pipeline::{ApiRequest, RequestPipeline};
use crate::error::{DocstreamError, Result};

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login/";
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout/";
pub const DEFAULT_PROFILE_PATH: &str = "/auth/profile/";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Endpoint paths, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPaths {
    pub login: String,
    pub logout: String,
    pub profile: String,
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_string(),
            logout: DEFAULT_LOGOUT_PATH.to_string(),
            profile: DEFAULT_PROFILE_PATH.to_string(),
        }
    }
}

/// How a logout ended on the server side. The local session is cleared
/// either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Nothing was stored.
    NotLoggedIn,
    /// The backend blacklisted the refresh token.
    Revoked,
    /// The backend call failed; only local state was cleared.
    LocalOnly(String),
}

#[derive(Clone)]
pub struct AuthClient {
    pipeline: RequestPipeline,
    paths: AuthPaths,
}

impl AuthClient {
    #[must_use]
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            pipeline,
            paths: AuthPaths::default(),
        }
    }

    #[must_use]
    pub fn with_paths(mut self, paths: AuthPaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub const fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Exchange email and password for a token pair and store it.
    ///
    /// Any previous session is replaced.
    ///
    /// # Errors
    ///
    /// - [`DocstreamError::LoginRejected`] for non-2xx statuses
    /// - [`DocstreamError::ParseResponse`] when the body has no token pair
    /// - [`DocstreamError::Network`] / [`DocstreamError::Timeout`] on transport failure
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<Identity>> {
        let url = self.pipeline.url(&self.paths.login);
        let timeout = self.pipeline.timeout();
        tracing::debug!(%url, "Logging in");

        let response = self
            .pipeline
            .client()
            .post(&url)
            .timeout(timeout)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| map_transport_error(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_body(response).await;
            tracing::info!(status = status.as_u16(), "Login rejected");
            return Err(DocstreamError::LoginRejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| DocstreamError::ParseResponse(e.to_string()))?;
        if body.access.is_empty() || body.refresh.is_empty() {
            return Err(DocstreamError::ParseResponse(
                "login response has an empty token".to_string(),
            ));
        }

        let store = self.pipeline.store();
        store.clear();
        store.set(CredentialPair::new(body.access, body.refresh));
        if let Some(user) = &body.user {
            store.set_identity(user.clone());
        }
        tracing::info!("Logged in");
        Ok(body.user)
    }

    /// Revoke the refresh token on the backend, then clear the session.
    ///
    /// The backend call is best effort. Its failure is reported in the
    /// outcome, never as an error.
    pub async fn logout(&self) -> LogoutOutcome {
        let store = self.pipeline.store();
        let Some(pair) = store.get() else {
            store.clear();
            return LogoutOutcome::NotLoggedIn;
        };

        let request =
            ApiRequest::post(&self.paths.logout).json(json!({ "refresh": pair.refresh_token }));
        let outcome = match self.pipeline.send_ok(request).await {
            Ok(_) => LogoutOutcome::Revoked,
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed; clearing local session only");
                LogoutOutcome::LocalOnly(e.to_string())
            }
        };

        store.clear();
        tracing::info!("Logged out");
        outcome
    }

    /// Fetch the profile and cache it as the session identity.
    ///
    /// # Errors
    ///
    /// - [`DocstreamError::NotLoggedIn`] without a stored session
    /// - anything [`RequestPipeline::send_json`] returns
    pub async fn profile(&self) -> Result<Identity> {
        if self.pipeline.store().get().is_none() {
            return Err(DocstreamError::NotLoggedIn);
        }
        let identity: Identity = self
            .pipeline
            .send_json(ApiRequest::get(&self.paths.profile))
            .await?;
        self.pipeline.store().set_identity(identity.clone());
        Ok(identity)
    }

    /// Force a token refresh.
    ///
    /// # Errors
    ///
    /// - [`DocstreamError::NotLoggedIn`] without a stored session
    /// - [`DocstreamError::RefreshFailed`]; the session is cleared
    pub async fn refresh(&self) -> Result<()> {
        if self.pipeline.store().get().is_none() {
            return Err(DocstreamError::NotLoggedIn);
        }
        self.pipeline.refresh_credentials().await
    }
}
