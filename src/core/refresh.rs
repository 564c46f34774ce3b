//! Token refresh protocol.
//!
//! Exchanges the stored refresh token for a new access token. The exchange
//! is a plain, unauthenticated call: it never goes through the request
//! pipeline, so a rejected refresh cannot trigger another refresh.
//!
//! Any failure clears the whole session. A stale access token is never left
//! behind after a failed exchange.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::credentials::CredentialStore;
use crate::core::http::DEFAULT_TIMEOUT;
use crate::error::RefreshFailure;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

/// Refresh exchange bound to one endpoint and one credential store.
#[derive(Clone)]
pub struct RefreshProtocol {
    client: Client,
    endpoint: String,
    store: Arc<dyn CredentialStore>,
    timeout: Duration,
}

impl RefreshProtocol {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the exchange timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Token-exchange endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one refresh exchange.
    ///
    /// On success only the access token is replaced. On failure the store
    /// is cleared. Without a stored refresh token no request is made.
    ///
    /// # Errors
    ///
    /// Returns the [`RefreshFailure`] that caused the store to be cleared.
    pub async fn refresh(&self) -> Result<(), RefreshFailure> {
        let Some(pair) = self.store.get() else {
            tracing::info!("No refresh token stored; clearing session");
            self.store.clear();
            return Err(RefreshFailure::MissingRefreshToken);
        };

        tracing::debug!(endpoint = %self.endpoint, "Refreshing access token");

        match self.exchange(&pair.refresh_token).await {
            Ok(access) => {
                // Another task may have logged out while the exchange was in flight.
                let Some(current) = self.store.get() else {
                    tracing::info!("Session cleared during refresh; discarding new token");
                    return Err(RefreshFailure::MissingRefreshToken);
                };
                self.store.set(current.with_access_token(access));
                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "Token refresh failed; clearing session");
                self.store.clear();
                Err(failure)
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<String, RefreshFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

        match body.access {
            Some(access) if !access.is_empty() => Ok(access),
            _ => Err(RefreshFailure::Malformed(
                "response has no access token".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::SessionStore;
    use crate::core::models::CredentialPair;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn protocol(server: &MockServer, store: Arc<SessionStore>) -> RefreshProtocol {
        RefreshProtocol::new(
            Client::new(),
            format!("{}/auth/token/refresh/", server.uri()),
            store,
        )
    }

    #[tokio::test]
    async fn success_replaces_only_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .and(body_json(serde_json::json!({"refresh": "r1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "a2", "refresh": "rotated"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(SessionStore::with_credentials(CredentialPair::new("a1", "r1")));
        protocol(&server, store.clone()).refresh().await.unwrap();

        assert_eq!(store.get(), Some(CredentialPair::new("a2", "r1")));
    }

    #[tokio::test]
    async fn missing_refresh_token_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(SessionStore::in_memory());
        let err = protocol(&server, store.clone()).refresh().await.unwrap_err();

        assert_eq!(err, RefreshFailure::MissingRefreshToken);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn rejection_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(SessionStore::with_credentials(CredentialPair::new("a1", "r1")));
        let err = protocol(&server, store.clone()).refresh().await.unwrap_err();

        assert_eq!(err, RefreshFailure::Rejected { status: 401 });
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn malformed_body_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "x"})))
            .mount(&server)
            .await;

        let store = Arc::new(SessionStore::with_credentials(CredentialPair::new("a1", "r1")));
        let err = protocol(&server, store.clone()).refresh().await.unwrap_err();

        assert!(matches!(err, RefreshFailure::Malformed(_)));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn transport_error_clears_session() {
        let store = Arc::new(SessionStore::with_credentials(CredentialPair::new("a1", "r1")));
        // Nothing listens on port 9 (discard) on test hosts.
        let refresh = RefreshProtocol::new(Client::new(), "http://127.0.0.1:9/refresh/", store.clone())
            .with_timeout(Duration::from_secs(2));

        let err = refresh.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshFailure::Transport(_)));
        assert!(store.get().is_none());
    }
}
