//! Authenticated HTTP client for the Curator platform
//!
//! Every feature service in the platform issues its requests through
//! [`Client::send`]. The client attaches the current access credential,
//! watches responses for credential expiry, and recovers transparently:
//!
//! 1. A request goes out with `Authorization: Bearer <access credential>`
//! 2. On the first 401 the client calls `POST /auth/refresh`; any request
//!    that hits a 401 while that call is outstanding is parked instead of
//!    issuing a second refresh
//! 3. On success the parked requests are replayed in arrival order with the
//!    new credential and each original caller receives its replayed result
//! 4. On failure everyone is rejected with the same error, the persisted
//!    session is cleared, and the user is sent to the application root
//!
//! Synthetic development sessions (dev-mock credentials) are exempt from
//! the teardown in step 4 — local sessions are not refreshable but must not
//! be logged out by the recovery machinery.
//!
//! Callers never see any of this: the contract is request in, `(status,
//! body)` out, or an error when the transport or the session itself fails.

pub mod auth;
mod classify;
pub mod client;
pub mod config;
pub mod error;
mod refresh;
pub mod request;

pub use auth::{LoginRequest, TokenPair};
pub use client::{Client, Navigator, NoopNavigator};
pub use config::Config;
pub use curator_session::{SessionRecord, SessionStore, UserSnapshot};
pub use error::{Error, Result};
pub use request::{ApiRequest, ApiResponse};
