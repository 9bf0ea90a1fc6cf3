//! Session record types and the persisted envelope format
//!
//! The record is either fully present (both credentials non-empty) or
//! absent — the client never operates on a half-populated session. The
//! envelope tags the stored shape with a schema version so the format can
//! migrate without silently misreading old entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version tag for the persisted envelope shape.
///
/// Bump when `SessionRecord` changes incompatibly and add a migration arm
/// in `store::decode_envelope`.
pub const SCHEMA_VERSION: u32 = 1;

/// Denormalized snapshot of the authenticated user.
///
/// Carried alongside the credentials so the UI can render identity without
/// a round-trip. The client itself never consults it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A complete authenticated session.
///
/// `access_credential` is short-lived and sent on every request;
/// `refresh_credential` is longer-lived and sent only to the refresh
/// endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub access_credential: String,
    pub refresh_credential: String,
    pub user: UserSnapshot,
}

impl SessionRecord {
    /// Whether both credentials are present. The store refuses to persist
    /// or surface a record for which this is false.
    pub fn is_complete(&self) -> bool {
        !self.access_credential.is_empty() && !self.refresh_credential.is_empty()
    }

    /// Replacement record after a refresh: new credential pair, same user
    /// snapshot.
    pub fn with_credentials(&self, access: String, refresh: String) -> Self {
        Self {
            access_credential: access,
            refresh_credential: refresh,
            user: self.user.clone(),
        }
    }
}

// Credentials are secrets: keep them out of Debug output and logs.
impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("access_credential", &"[REDACTED]")
            .field("refresh_credential", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Persisted shape: `{"state": {...}, "schemaVersion": 1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    pub state: SessionRecord,
    pub schema_version: u32,
}
