//! Session persistence for the Curator client
//!
//! Holds the single source of truth for "who is logged in": a session record
//! (credential pair + user snapshot) persisted as a versioned JSON envelope.
//! The store tolerates absent or malformed entries by reporting "no session"
//! instead of failing, so a corrupt file degrades to an unauthenticated
//! client rather than a crash.
//!
//! Session lifecycle:
//! 1. Login writes a complete record via `SessionStore::write()`
//! 2. Every outgoing request reads the access credential via `read()`
//! 3. A refresh replaces the credential pair via `write()`
//! 4. Logout or an unrecoverable refresh failure calls `clear()`

pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use record::{SCHEMA_VERSION, SessionRecord, UserSnapshot};
pub use store::{DEV_MOCK_PREFIX, MockPredicate, SessionStore, prefix_predicate};
