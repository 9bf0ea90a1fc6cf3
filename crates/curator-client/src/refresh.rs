//! Single-flight credential refresh and request replay
//!
//! However many requests discover an expired credential concurrently,
//! exactly one refresh call goes out. The first 401 becomes the trigger and
//! performs the call itself; every later 401 parks as a pending request
//! instead. On success the parked requests are replayed in arrival order
//! with the new credential, the trigger's own request last. On failure
//! everyone is rejected with the same error and the session is torn down
//! (dev-mock sessions excepted).
//!
//! State invariants: `in_flight` is true exactly while the refresh call is
//! outstanding, and the queue is non-empty only while it is true. The drain
//! takes the whole queue and resets the flag under one lock acquisition, so
//! no request can observe a half-drained queue — a 401 arriving after the
//! drain starts a fresh cycle against the new credential.
//!
//! A refresh is attempted at most once per expiry event and never retried
//! on its own failure. Pending requests have no cancellation handle; each
//! is settled when its cycle concludes or abandoned with the process.

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use curator_session::SessionRecord;

use crate::auth::{self, TokenPair};
use crate::classify::Attempt;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::request::ApiResponse;

/// Coordinator state, one per client instance.
pub(crate) struct RefreshState {
    in_flight: bool,
    queue: Vec<PendingRequest>,
}

impl RefreshState {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: false,
            queue: Vec::new(),
        }
    }
}

/// One caller's retry intent, parked while a refresh is outstanding. Owned
/// exclusively by the queue; the caller holds only the receiving half.
struct PendingRequest {
    attempt: Attempt,
    done: oneshot::Sender<Result<ApiResponse>>,
}

impl Client {
    /// Route a 401-classified request through the refresh cycle.
    ///
    /// Joins the in-flight cycle when there is one, otherwise becomes the
    /// trigger and runs the cycle itself.
    pub(crate) async fn recover(&self, attempt: Attempt) -> Result<ApiResponse> {
        let waiter = {
            let mut state = self.refresh.lock().await;
            if state.in_flight {
                let (done, rx) = oneshot::channel();
                state.queue.push(PendingRequest { attempt, done });
                debug!(parked = state.queue.len(), "refresh in flight, parking request");
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        match waiter {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(Error::SessionExpired("refresh cycle abandoned".into()))
            }),
            None => self.run_cycle(attempt).await,
        }
    }

    /// The trigger path: one refresh call, then drain the queue.
    async fn run_cycle(&self, attempt: Attempt) -> Result<ApiResponse> {
        let Some(record) = self.store.read().await else {
            // A 401 with nothing to refresh from ends the session.
            return self
                .conclude_failure(None, Error::SessionExpired("no stored session to refresh".into()))
                .await;
        };

        match auth::refresh_session(&self.http, &self.base_url, &record.refresh_credential).await {
            Ok(tokens) => self.conclude_success(attempt, record, tokens).await,
            Err(cause) => self.conclude_failure(Some(record), cause).await,
        }
    }

    /// Success path: persist the new pair, replay parked requests in FIFO
    /// order, then replay the trigger.
    async fn conclude_success(
        &self,
        attempt: Attempt,
        record: SessionRecord,
        tokens: TokenPair,
    ) -> Result<ApiResponse> {
        let updated = record.with_credentials(tokens.access_credential, tokens.refresh_credential);
        if let Err(e) = self.store.write(&updated).await {
            // The in-memory record is already current; keep the cycle going.
            warn!(error = %e, "failed to persist refreshed session");
        }
        info!("credential refresh succeeded");

        let parked = self.drain_queue().await;
        if !parked.is_empty() {
            debug!(replaying = parked.len(), "replaying requests held during refresh");
        }
        for pending in parked {
            let result = self.transmit(&pending.attempt.request).await;
            let _ = pending.done.send(result);
        }

        self.transmit(&attempt.request).await
    }

    /// Failure path: reject the trigger and every parked request with the
    /// same error. Outside dev-mock the session is cleared and navigation
    /// to the application root fires exactly once.
    async fn conclude_failure(
        &self,
        record: Option<SessionRecord>,
        cause: Error,
    ) -> Result<ApiResponse> {
        let parked = self.drain_queue().await;

        let torn_down = self
            .fail_session(record.as_ref(), "credential refresh failed")
            .await;
        let error = if torn_down {
            Error::SessionExpired(cause.to_string())
        } else {
            debug!(error = %cause, "dev-mock session, refresh failure is non-fatal");
            cause
        };

        for pending in parked {
            let _ = pending.done.send(Err(error.clone()));
        }
        Err(error)
    }

    /// Return to idle: reset the flag and take the queue in one lock
    /// acquisition.
    async fn drain_queue(&self) -> Vec<PendingRequest> {
        let mut state = self.refresh.lock().await;
        state.in_flight = false;
        std::mem::take(&mut state.queue)
    }
}
