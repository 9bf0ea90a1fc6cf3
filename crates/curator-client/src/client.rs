//! The authenticated API client
//!
//! Owns the request path every feature service shares: attach the current
//! access credential, send, classify the outcome, and either hand the
//! response back or route the request through the refresh coordinator.
//! Also carries the session lifecycle edges (login creates the record,
//! logout and terminal refresh failure destroy it).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, info, instrument, warn};

use curator_session::{SessionRecord, SessionStore, UserSnapshot, prefix_predicate};

use crate::auth::{self, LoginRequest};
use crate::classify::{Attempt, Outcome, classify};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::refresh::RefreshState;
use crate::request::{ApiRequest, ApiResponse};

/// Terminal-effect seam: where the user lands when the session fails.
///
/// The client only ever asks for the application root; how that navigation
/// happens belongs to the embedding shell.
pub trait Navigator: Send + Sync {
    fn to_root(&self);
}

/// Navigator that goes nowhere, for headless embedders and tests.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn to_root(&self) {}
}

/// Authenticated HTTP client with single-flight credential refresh.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. Each instance
/// owns its refresh state, so clients in different tests cannot interfere.
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) refresh: tokio::sync::Mutex<RefreshState>,
}

impl Client {
    /// Create a client against the given base URL.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("building http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
            navigator,
            refresh: tokio::sync::Mutex::new(RefreshState::new()),
        })
    }

    /// Create a client from loaded configuration, opening the session store
    /// at the configured path with the configured dev-mock marker.
    pub async fn from_config(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let store = Arc::new(
            SessionStore::load_with_predicate(
                config.session.file.clone(),
                prefix_predicate(&config.session.mock_marker),
            )
            .await,
        );
        Self::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.timeout_secs),
            store,
            navigator,
        )
    }

    /// The session store backing this client.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Issue an authenticated request.
    ///
    /// A 401 caused by an expired credential is recovered transparently:
    /// the caller sees only the replayed result, possibly after the refresh
    /// round-trip. Any other status passes through unchanged.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        self.dispatch(Attempt::first(request), &request_id).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::POST, path).with_body(body))
            .await
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::PUT, path).with_body(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }

    /// Authenticate and persist the resulting session record.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSnapshot> {
        let login = auth::login(
            &self.http,
            &self.base_url,
            &LoginRequest {
                email: email.into(),
                password: password.into(),
            },
        )
        .await?;

        let record = SessionRecord {
            access_credential: login.tokens.access_credential,
            refresh_credential: login.tokens.refresh_credential,
            user: login.user,
        };
        self.store.write(&record).await?;
        info!(user_id = %record.user.id, "logged in");
        Ok(record.user)
    }

    /// Clear the session and send the user to the application root.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        self.navigator.to_root();
        info!("logged out");
        Ok(())
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %attempt.request.method, path = %attempt.request.path))]
    async fn dispatch(&self, attempt: Attempt, request_id: &str) -> Result<ApiResponse> {
        let response = self.transmit(&attempt.request).await?;
        match classify(&attempt, response) {
            Outcome::PassThrough(response) => Ok(response),
            Outcome::RefreshAndRetry => {
                debug!("access credential expired, entering refresh");
                self.recover(attempt.into_retry()).await
            }
            Outcome::SessionFailed(response) => {
                warn!("refresh endpoint rejected the credential");
                let record = self.store.read().await;
                self.fail_session(record.as_ref(), "refresh credential rejected")
                    .await;
                Ok(response)
            }
        }
    }

    /// Attach the current credential and send the request over the wire.
    ///
    /// Network failures (no response at all) surface as `Error::Network`
    /// and never enter the refresh path.
    pub(crate) async fn transmit(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = auth::join(&self.base_url, &request.path);
        let mut headers = request.headers.clone();
        self.annotate(&mut headers).await;

        let mut outbound = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &request.body {
            outbound = outbound.json(body);
        }

        let response = outbound.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("request timed out: {e}"))
            } else {
                Error::Network(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("reading response body: {e}")))?;
        Ok(ApiResponse { status, body })
    }

    /// Attach `Authorization: Bearer <access credential>` when a session is
    /// present. Without one the request goes out unauthenticated and the
    /// backend answers with its own 401.
    async fn annotate(&self, headers: &mut HeaderMap) {
        let Some(record) = self.store.read().await else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", record.access_credential)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                warn!(error = %e, "stored credential is not header-safe, sending unauthenticated");
            }
        }
    }

    /// Tear down the session after an unrecoverable auth failure, unless it
    /// is a dev-mock session (local sessions are not refreshable and must
    /// not be logged out by the recovery machinery).
    ///
    /// Returns whether the teardown ran.
    pub(crate) async fn fail_session(&self, record: Option<&SessionRecord>, reason: &str) -> bool {
        if let Some(record) = record {
            if self.store.is_dev_mock(record) {
                debug!("dev-mock session, skipping teardown");
                return false;
            }
        }
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear session during teardown");
        }
        self.navigator.to_root();
        info!(reason, "session cleared, navigating to application root");
        true
    }
}
