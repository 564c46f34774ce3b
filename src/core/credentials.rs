//! Credential store.
//!
//! Single source of truth for the current token pair and cached identity.
//! The request pipeline and the refresh protocol read and write credentials
//! only through [`CredentialStore`]; neither keeps a copy beyond one call.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::models::{CredentialPair, Identity, Session};
use crate::error::Result;

/// Get/set/clear access to the authentication state.
///
/// Implementations use interior mutability and must be shareable across
/// tasks. Each method is atomic on its own; no lock spans a network call.
/// Persistence, when present, completes before the method returns.
pub trait CredentialStore: Send + Sync {
    /// Current pair, or `None` when anonymous.
    fn get(&self) -> Option<CredentialPair>;

    /// Replace the pair. The cached identity is kept.
    fn set(&self, pair: CredentialPair);

    /// Drop both tokens and the cached identity.
    fn clear(&self);

    /// Cached identity, if any.
    fn identity(&self) -> Option<Identity>;

    /// Replace the cached identity.
    fn set_identity(&self, identity: Identity);
}

/// Persistence for a [`Session`].
///
/// Backends are external collaborators; see `storage::session`.
pub trait SessionBackend: Send + Sync {
    /// Load the stored session. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<Session>>;

    /// Store the session, replacing any previous one.
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session. Removing nothing is not an error.
    fn delete(&self) -> Result<()>;

    /// Short description for diagnostics (never includes secrets).
    fn describe(&self) -> String;
}

/// [`CredentialStore`] holding the session in memory and writing it through
/// to an optional backend.
///
/// Backend writes happen under the state lock, so the backend always sees
/// mutations in the same order as memory. Write-through failures are logged
/// and do not affect the in-memory state, which stays authoritative for the
/// running process.
pub struct SessionStore {
    state: Mutex<Session>,
    backend: Option<Box<dyn SessionBackend>>,
}

impl SessionStore {
    /// Store with no persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(Session::default()),
            backend: None,
        }
    }

    /// In-memory store pre-populated with a pair.
    #[must_use]
    pub fn with_credentials(pair: CredentialPair) -> Self {
        Self {
            state: Mutex::new(Session::from_pair(&pair, None)),
            backend: None,
        }
    }

    /// Open a store backed by `backend`, loading any persisted session.
    ///
    /// A session holding only one of the two tokens is discarded and the
    /// backend cleared. A backend that fails to load reads as anonymous.
    pub fn open(backend: Box<dyn SessionBackend>) -> Self {
        let loaded = match backend.load() {
            Ok(session) => session.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(backend = %backend.describe(), error = %e, "Failed to load session; starting anonymous");
                Session::default()
            }
        };

        let session = if loaded.is_incomplete() {
            tracing::warn!(backend = %backend.describe(), "Discarding session with a single token");
            if let Err(e) = backend.delete() {
                tracing::warn!(error = %e, "Failed to remove incomplete session");
            }
            Session::default()
        } else {
            loaded
        };

        tracing::debug!(
            backend = %backend.describe(),
            authenticated = session.credentials().is_some(),
            "Session store opened"
        );

        Self {
            state: Mutex::new(session),
            backend: Some(backend),
        }
    }

    /// Description of the persistence backend.
    #[must_use]
    pub fn backend_description(&self) -> String {
        self.backend
            .as_ref()
            .map_or_else(|| "memory".to_string(), |b| b.describe())
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, session: &Session) {
        let Some(backend) = &self.backend else {
            return;
        };
        let outcome = if session.credentials().is_some() {
            backend.save(session)
        } else {
            backend.delete()
        };
        if let Err(e) = outcome {
            tracing::warn!(backend = %backend.describe(), error = %e, "Failed to persist session");
        }
    }
}

impl CredentialStore for SessionStore {
    fn get(&self) -> Option<CredentialPair> {
        self.lock().credentials()
    }

    fn set(&self, pair: CredentialPair) {
        let mut state = self.lock();
        let user = state.user.take();
        *state = Session::from_pair(&pair, user);
        self.persist(&state);
    }

    fn clear(&self) {
        let mut state = self.lock();
        *state = Session::default();
        self.persist(&state);
        drop(state);
        tracing::debug!("Credentials cleared");
    }

    fn identity(&self) -> Option<Identity> {
        self.lock().user.clone()
    }

    fn set_identity(&self, identity: Identity) {
        let mut state = self.lock();
        state.user = Some(identity);
        if state.credentials().is_some() {
            self.persist(&state);
        }
    }
}
