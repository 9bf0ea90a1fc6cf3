//! Response classification
//!
//! Decides what a completed response means for the session: hand it to the
//! caller, route the request through a credential refresh, or fail the
//! whole session. The `already_retried` marker bounds liveness — a request
//! is retried at most once, so a credential the backend keeps rejecting
//! cannot loop through the refresh path.

use reqwest::StatusCode;

use crate::auth::REFRESH_PATH;
use crate::request::{ApiRequest, ApiResponse};

/// A request plus its retry marker. Constructed fresh for each caller so
/// retry state is never smuggled through caller-owned data.
#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub request: ApiRequest,
    pub already_retried: bool,
}

impl Attempt {
    pub fn first(request: ApiRequest) -> Self {
        Self {
            request,
            already_retried: false,
        }
    }

    /// Mark the attempt as retried before routing it into the coordinator.
    pub fn into_retry(mut self) -> Self {
        self.already_retried = true;
        self
    }
}

/// What to do with a completed response.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Hand the response to the caller unchanged. Covers every non-401
    /// status and a 401 on an attempt that was already retried.
    PassThrough(ApiResponse),
    /// First 401 on an ordinary request: refresh the credential and replay.
    RefreshAndRetry,
    /// 401 from the refresh endpoint itself: terminal for the session.
    SessionFailed(ApiResponse),
}

/// Classify a completed response. Pure: all side effects (queueing,
/// teardown, navigation) belong to the client.
pub(crate) fn classify(attempt: &Attempt, response: ApiResponse) -> Outcome {
    if response.status != StatusCode::UNAUTHORIZED {
        return Outcome::PassThrough(response);
    }
    if attempt.request.path == REFRESH_PATH {
        return Outcome::SessionFailed(response);
    }
    if attempt.already_retried {
        return Outcome::PassThrough(response);
    }
    Outcome::RefreshAndRetry
}
