//! Authenticated request pipeline.
//!
//! Every authenticated call goes through [`RequestPipeline::send`]:
//!
//! 1. Attach `Authorization: Bearer <access>` when a credential pair exists.
//! 2. Dispatch.
//! 3. On 401, if the call has not been retried yet, mark it retried, run the
//!    refresh protocol and, on success, dispatch the original request again
//!    with the new token. The second response is final.
//! 4. A 401 on an already-retried call, or a failed refresh, is returned as
//!    [`DocstreamError::Unauthorized`].
//! 5. Every other response is returned unmodified.
//!
//! The pipeline is the only component that triggers refreshes. Concurrent
//! calls are not coordinated: two calls that both see a 401 each run their
//! own refresh.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::core::credentials::CredentialStore;
use crate::core::http::{DEFAULT_TIMEOUT, map_transport_error, read_capped_body};
use crate::core::refresh::RefreshProtocol;
use crate::error::{DocstreamError, Result, UnauthorizedReason};

// =============================================================================
// Requests
// =============================================================================

/// Request body. Kept as data so the same request can be dispatched twice.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// `multipart/form-data` text fields, in order.
    Multipart(Vec<(String, String)>),
}

/// An outbound API call, independent of any credential.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL.
    pub target: String,
    pub body: RequestBody,
    /// Per-request timeout override. Ignored for streaming requests.
    pub timeout: Option<Duration>,
    /// Streaming responses get no overall timeout.
    pub streaming: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: RequestBody::Empty,
            timeout: None,
            streaming: false,
        }
    }

    #[must_use]
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    #[must_use]
    pub fn multipart<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Multipart(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

/// A request together with its one-shot retry flag.
///
/// `retried` goes from `false` to `true` at most once, which bounds every
/// call to a single refresh and a single re-dispatch.
#[derive(Debug)]
pub struct PendingRequest {
    request: ApiRequest,
    retried: bool,
}

impl PendingRequest {
    #[must_use]
    pub const fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    #[must_use]
    pub const fn request(&self) -> &ApiRequest {
        &self.request
    }

    #[must_use]
    pub const fn retried(&self) -> bool {
        self.retried
    }

    /// Flip `retried` to true. Returns `false` if it was already set.
    pub const fn mark_retried(&mut self) -> bool {
        if self.retried {
            return false;
        }
        self.retried = true;
        true
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Credential-bearing HTTP client with one-shot refresh-and-retry.
#[derive(Clone)]
pub struct RequestPipeline {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    refresher: RefreshProtocol,
    timeout: Duration,
}

impl RequestPipeline {
    /// Build a pipeline. `refresh_target` is resolved against `base_url`.
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        refresh_target: &str,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let refresher = RefreshProtocol::new(
            client.clone(),
            join_url(&base_url, refresh_target),
            store.clone(),
        );
        Self {
            client,
            base_url,
            store,
            refresher,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Default timeout for non-streaming calls, refresh included.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.refresher = self.refresher.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for a target path.
    #[must_use]
    pub fn url(&self, target: &str) -> String {
        join_url(&self.base_url, target)
    }

    /// Run the refresh protocol outside of any request.
    ///
    /// # Errors
    ///
    /// Returns [`DocstreamError::RefreshFailed`]; the session is cleared.
    pub async fn refresh_credentials(&self) -> Result<()> {
        self.refresher
            .refresh()
            .await
            .map_err(DocstreamError::RefreshFailed)
    }

    /// Send a request with refresh-and-retry on 401.
    ///
    /// # Errors
    ///
    /// - [`DocstreamError::Unauthorized`] when a 401 could not be recovered
    /// - [`DocstreamError::Network`] / [`DocstreamError::Timeout`] on transport failure
    ///
    /// Non-2xx statuses other than 401 are returned as `Ok`.
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let mut pending = PendingRequest::new(request);
        self.send_pending(&mut pending).await
    }

    /// Drive one pending request to its final response.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::send`].
    pub async fn send_pending(&self, pending: &mut PendingRequest) -> Result<Response> {
        loop {
            let response = self.dispatch(pending).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let target = pending.request().target.clone();
            if !pending.mark_retried() {
                tracing::warn!(%target, "Unauthorized after token refresh; giving up");
                return Err(DocstreamError::Unauthorized {
                    target,
                    reason: UnauthorizedReason::RetryExhausted,
                });
            }

            tracing::info!(%target, "Unauthorized; attempting token refresh");
            if let Err(failure) = self.refresher.refresh().await {
                return Err(DocstreamError::Unauthorized {
                    target,
                    reason: UnauthorizedReason::RefreshFailed(failure),
                });
            }
        }
    }

    /// Send and require a 2xx status.
    ///
    /// # Errors
    ///
    /// Returns [`DocstreamError::Http`] with a capped body for non-2xx
    /// statuses, plus everything [`RequestPipeline::send`] returns.
    pub async fn send_ok(&self, request: ApiRequest) -> Result<Response> {
        let target = request.target.clone();
        let response = self.send(request).await?;
        ensure_success(response, &target).await
    }

    /// Send and decode a 2xx JSON body.
    ///
    /// # Errors
    ///
    /// As [`RequestPipeline::send_ok`], plus [`DocstreamError::ParseResponse`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send_ok(request)
            .await?
            .json()
            .await
            .map_err(|e| DocstreamError::ParseResponse(e.to_string()))
    }

    async fn dispatch(&self, pending: &PendingRequest) -> Result<Response> {
        let request = pending.request();
        let credentials = self.store.get();

        tracing::debug!(
            method = %request.method,
            target = %request.target,
            authenticated = credentials.is_some(),
            retried = pending.retried(),
            "Dispatching request"
        );

        let mut builder = self.builder(request);
        if let Some(pair) = credentials {
            builder = builder.bearer_auth(&pair.access_token);
        }

        let timeout = request.timeout.unwrap_or(self.timeout);
        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(&e, timeout))?;

        tracing::debug!(
            target = %request.target,
            status = response.status().as_u16(),
            "Response received"
        );
        Ok(response)
    }

    fn builder(&self, request: &ApiRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.target));

        if !request.streaming {
            builder = builder.timeout(request.timeout.unwrap_or(self.timeout));
        }

        match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (name, value)| {
                        form.text(name.clone(), value.clone())
                    });
                builder.multipart(form)
            }
        }
    }
}

/// Turn a non-2xx response into [`DocstreamError::Http`].
///
/// # Errors
///
/// Returns [`DocstreamError::Http`] when the status is not 2xx.
pub async fn ensure_success(response: Response, target: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_capped_body(response).await;
    Err(DocstreamError::Http {
        status: status.as_u16(),
        target: target.to_string(),
        body,
    })
}

fn join_url(base: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    let base = base.trim_end_matches('/');
    if target.starts_with('/') {
        format!("{base}{target}")
    } else {
        format!("{base}/{target}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_request_flips_once() {
        let mut pending = PendingRequest::new(ApiRequest::get("/x"));
        assert!(!pending.retried());
        assert!(pending.mark_retried());
        assert!(pending.retried());
        assert!(!pending.mark_retried());
        assert!(pending.retried());
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h/api/v1", "/auth/"), "http://h/api/v1/auth/");
        assert_eq!(join_url("http://h/api/v1/", "auth/"), "http://h/api/v1/auth/");
        assert_eq!(join_url("http://h/api", "https://other/x"), "https://other/x");
    }

    #[test]
    fn multipart_fields_keep_order() {
        let request = ApiRequest::post("/f").multipart([("mode", "paper"), ("input_content", "x")]);
        match request.body {
            RequestBody::Multipart(fields) => {
                assert_eq!(fields[0].0, "mode");
                assert_eq!(fields[1], ("input_content".to_string(), "x".to_string()));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
