//! File-backed session storage
//!
//! Persists the session envelope as a single JSON file. All writes use
//! atomic temp-file + rename to prevent corruption on crash, and the file is
//! created 0600 since it holds credentials. A tokio Mutex guards the
//! in-memory state; reads acquire it briefly to clone, so request-time reads
//! don't block on a concurrent persist.
//!
//! Reads are tolerant: an absent, unreadable, malformed, wrong-version, or
//! incomplete entry all surface as "no session". Requests then simply go out
//! unauthenticated and the backend answers with its own 401.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{Envelope, SCHEMA_VERSION, SessionRecord};

/// Marker prefix identifying synthetic local-development credentials.
pub const DEV_MOCK_PREFIX: &str = "dev-mock-";

/// Decides whether a record is a non-refreshable development session.
/// Injectable so tests and deployments can swap the policy.
pub type MockPredicate = Arc<dyn Fn(&SessionRecord) -> bool + Send + Sync>;

/// Predicate recognizing credentials that carry the given marker prefix.
pub fn prefix_predicate(prefix: &str) -> MockPredicate {
    let prefix = prefix.to_owned();
    Arc::new(move |record: &SessionRecord| {
        record.access_credential.starts_with(&prefix)
            || record.refresh_credential.starts_with(&prefix)
    })
}

/// Single-slot session store backed by a JSON file.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<Option<SessionRecord>>,
    mock_predicate: MockPredicate,
}

impl SessionStore {
    /// Load the session from the given path with the default dev-mock
    /// predicate (`DEV_MOCK_PREFIX` on either credential).
    pub async fn load(path: PathBuf) -> Self {
        Self::load_with_predicate(path, prefix_predicate(DEV_MOCK_PREFIX)).await
    }

    /// Load the session from the given path with a custom dev-mock predicate.
    ///
    /// Never fails: anything short of a well-formed, current-version,
    /// complete envelope starts the store empty.
    pub async fn load_with_predicate(path: PathBuf, mock_predicate: MockPredicate) -> Self {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => decode_envelope(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted session");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "session file unreadable, starting without a session");
                None
            }
        };

        Self {
            path,
            state: Mutex::new(state),
            mock_predicate,
        }
    }

    /// Clone of the current session record, if any.
    pub async fn read(&self) -> Option<SessionRecord> {
        let state = self.state.lock().await;
        state.clone()
    }

    /// Replace the session record and persist it.
    ///
    /// Rejects incomplete records so a half-populated session can never be
    /// observed. The in-memory state is updated before the persist, so a
    /// disk failure leaves the new credentials usable for this process.
    pub async fn write(&self, record: &SessionRecord) -> Result<()> {
        if !record.is_complete() {
            return Err(Error::Incomplete(
                "both credentials must be non-empty".into(),
            ));
        }

        let mut state = self.state.lock().await;
        *state = Some(record.clone());
        persist(&self.path, record).await
    }

    /// Drop the session record and remove the persisted file.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(format!("removing session file: {e}"))),
        }
    }

    /// Whether the record is a synthetic development session that must not
    /// be logged out by a failed refresh.
    pub fn is_dev_mock(&self, record: &SessionRecord) -> bool {
        (self.mock_predicate)(record)
    }
}

/// Parse a persisted envelope, degrading to `None` on any mismatch.
fn decode_envelope(path: &Path, contents: &str) -> Option<SessionRecord> {
    let envelope: Envelope = match serde_json::from_str(contents) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed session entry, discarding");
            return None;
        }
    };

    if envelope.schema_version != SCHEMA_VERSION {
        warn!(
            path = %path.display(),
            found = envelope.schema_version,
            expected = SCHEMA_VERSION,
            "unsupported session schema version, discarding"
        );
        return None;
    }

    if !envelope.state.is_complete() {
        warn!(path = %path.display(), "incomplete session entry, discarding");
        return None;
    }

    debug!(path = %path.display(), "loaded persisted session");
    Some(envelope.state)
}

/// Write the envelope atomically: temp file in the same directory, 0600
/// permissions, then rename over the target.
async fn persist(path: &Path, record: &SessionRecord) -> Result<()> {
    let envelope = Envelope {
        state: record.clone(),
        schema_version: SCHEMA_VERSION,
    };
    let json = serde_json::to_string_pretty(&envelope)
        .map_err(|e| Error::Encode(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
