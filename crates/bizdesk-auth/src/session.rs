//! Session store with FSM-based state tracking.
//!
//! The [`SessionStore`] owns the in-memory session (identity + credential)
//! for the lifetime of the process and mirrors it to persistent storage on
//! login and logout. Construction hydrates synchronously from storage
//! without touching the network; [`SessionStore::revalidate`] is the opt-in
//! server check.

use crate::guard::SessionView;
use crate::session_fsm::{
    SessionChanged, SessionMachine, SessionMachineInput, SessionState,
};
use crate::{AuthClient, AuthError, AuthResult, Identity, IdentityPatch};
use bizdesk_storage::{SessionPersistence, StoredSession};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback type for session state change notifications.
pub type SessionCallback = Box<dyn Fn(SessionChanged) + Send + Sync>;

#[derive(Debug, Clone)]
struct Session {
    identity: Identity,
    credential: String,
}

/// Point-in-time copy of the store, for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub identity: Option<Identity>,
    pub has_credential: bool,
}

impl SessionView for SessionSnapshot {
    fn is_loading(&self) -> bool {
        self.state == SessionState::Hydrating
    }

    fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.has_credential
    }
}

/// Holds the current user's session.
pub struct SessionStore {
    persistence: Arc<SessionPersistence>,
    client: AuthClient,
    /// Internal FSM for tracking session state transitions.
    fsm: Mutex<SessionMachine>,
    session: Mutex<Option<Session>>,
    /// Optional callback for state change notifications.
    state_callback: Mutex<Option<SessionCallback>>,
}

impl SessionStore {
    /// Create the store and hydrate it from persistent storage.
    pub fn new(persistence: Arc<SessionPersistence>, client: AuthClient) -> Self {
        Self::with_state_callback(persistence, client, None)
    }

    /// Like [`new`](Self::new), with the callback installed before hydration
    /// so it observes the initial transition.
    pub fn with_state_callback(
        persistence: Arc<SessionPersistence>,
        client: AuthClient,
        callback: Option<SessionCallback>,
    ) -> Self {
        let store = Self {
            persistence,
            client,
            fsm: Mutex::new(SessionMachine::new()),
            session: Mutex::new(None),
            state_callback: Mutex::new(callback),
        };
        store.hydrate();
        store
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    /// Get the current FSM state.
    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().state())
    }

    /// The client used for the authentication endpoints.
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            self.notify_state_change(new_state);
        }

        Ok(new_state)
    }

    fn notify_state_change(&self, state: SessionState) {
        let email = self
            .session
            .lock()
            .as_ref()
            .map(|s| s.identity.email.clone());

        let cb = self.state_callback.lock();
        if let Some(callback) = cb.as_ref() {
            callback(SessionChanged { state, email });
        }
    }

    /// Read the persisted pair. Runs once, from the constructor.
    fn hydrate(&self) {
        let restored = match self.persistence.load_session::<Identity>() {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session, starting signed out");
                None
            }
        };

        let input = match restored {
            Some(StoredSession { token, user }) => {
                info!(email = %user.email, "Restored persisted session");
                *self.session.lock() = Some(Session {
                    identity: user,
                    credential: token,
                });
                SessionMachineInput::SessionRestored
            }
            None => {
                debug!("No persisted session");
                SessionMachineInput::NoSession
            }
        };

        // Hydrating accepts both inputs, so this cannot fail.
        if let Err(e) = self.transition(&input) {
            warn!(error = %e, "Hydration transition rejected");
        }
    }

    /// Login with email and password.
    ///
    /// On success the returned token and identity replace the session in
    /// memory and in storage. On failure nothing is written and the error is
    /// returned as-is; an existing session stays in place. If the store is
    /// logged out while the request is in flight, the response is discarded
    /// and [`AuthError::NotLoggedIn`] is returned.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Identity> {
        self.transition(&SessionMachineInput::LoginAttempt)?;
        info!(email = %email, "Logging in");

        let result = self.client.login(email, password).await;
        if !matches!(
            self.state(),
            SessionState::SigningIn | SessionState::Reauthenticating
        ) {
            info!(email = %email, "Logged out during login, discarding response");
            return Err(AuthError::NotLoggedIn);
        }

        let login = match result {
            Ok(login) => login,
            Err(e) => {
                warn!(email = %email, error = %e, "Login failed");
                self.transition(&SessionMachineInput::LoginFailed)?;
                return Err(e);
            }
        };

        if let Err(e) = self.persistence.save_session(&login.token, &login.user) {
            warn!(error = %e, "Failed to persist session");
            self.settle_failed_save()?;
            return Err(e.into());
        }

        *self.session.lock() = Some(Session {
            identity: login.user.clone(),
            credential: login.token,
        });
        self.transition(&SessionMachineInput::LoginSuccess)?;

        info!(email = %login.user.email, "Login successful");
        Ok(login.user)
    }

    /// After a failed save, keep the in-memory session only if storage still
    /// holds its credential.
    fn settle_failed_save(&self) -> AuthResult<()> {
        let stored = match self.persistence.get_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Cannot read stored credential after failed save");
                None
            }
        };
        let kept = match (self.session.lock().as_ref(), stored.as_deref()) {
            (Some(session), Some(token)) => session.credential == token,
            _ => false,
        };

        if kept {
            self.transition(&SessionMachineInput::LoginFailed)?;
        } else {
            if let Some(lost) = self.session.lock().take() {
                warn!(email = %lost.identity.email, "Previous session lost with failed save");
            }
            self.transition(&SessionMachineInput::SaveFailed)?;
        }
        Ok(())
    }

    /// Clear the session from memory and storage. Safe to call when signed
    /// out, and while a login or verification is in flight; their responses
    /// are then discarded.
    pub fn logout(&self) -> AuthResult<()> {
        if let Err(e) = self.transition(&SessionMachineInput::LogoutRequested) {
            // Another logout is mid-way; clearing again is harmless.
            debug!(error = %e, "Logout already in progress");
        }

        let previous = self.session.lock().take();
        let cleared = self.persistence.clear_session();

        if let Err(e) = self.transition(&SessionMachineInput::LogoutComplete) {
            debug!(error = %e, "Logout already completed");
        }

        cleared?;
        match previous {
            Some(session) => info!(email = %session.identity.email, "Logged out"),
            None => debug!("Logout with no active session"),
        }
        Ok(())
    }

    /// The in-memory identity, if signed in.
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.lock().as_ref().map(|s| s.identity.clone())
    }

    /// The in-memory credential, if signed in.
    pub fn credential(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.credential.clone())
    }

    /// Merge a profile patch into the in-memory identity. Storage keeps the
    /// identity from the last login.
    pub fn update_identity(&self, patch: &IdentityPatch) -> AuthResult<Identity> {
        let mut session = self.session.lock();
        let session = session.as_mut().ok_or(AuthError::NotLoggedIn)?;
        session.identity.merge(patch);
        debug!(email = %session.identity.email, "Identity updated in memory");
        Ok(session.identity.clone())
    }

    /// Replace the in-memory identity wholesale, for when the server returns
    /// the authoritative copy.
    pub fn replace_identity(&self, identity: Identity) -> AuthResult<()> {
        let mut session = self.session.lock();
        let session = session.as_mut().ok_or(AuthError::NotLoggedIn)?;
        session.identity = identity;
        Ok(())
    }

    /// Check the stored credential with the server.
    ///
    /// - success: the server's identity replaces the in-memory one
    /// - 401/403: the session is cleared everywhere and
    ///   [`AuthError::SessionRejected`] is returned
    /// - anything else: the error is returned and the session kept
    ///
    /// A logout while the request is in flight wins: the response is
    /// discarded and [`AuthError::NotLoggedIn`] is returned.
    pub async fn revalidate(&self) -> AuthResult<Identity> {
        if self.session.lock().is_none() {
            return Err(AuthError::NotLoggedIn);
        }
        self.transition(&SessionMachineInput::VerifyRequested)?;

        let result = self.client.current_user().await;
        if self.state() != SessionState::Verifying {
            info!("Logged out during verification, discarding response");
            return Err(AuthError::NotLoggedIn);
        }

        match result {
            Ok(identity) => {
                if let Some(session) = self.session.lock().as_mut() {
                    session.identity = identity.clone();
                }
                self.transition(&SessionMachineInput::ServerVerified)?;
                info!(email = %identity.email, "Session verified with server");
                Ok(identity)
            }
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "Server rejected stored session, clearing it");
                self.session.lock().take();
                let cleared = self.persistence.clear_session();
                self.transition(&SessionMachineInput::ServerRejected)?;
                cleared?;
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Session verification inconclusive");
                self.transition(&SessionMachineInput::VerifyInconclusive)?;
                Err(e)
            }
        }
    }

    /// Copy the current state for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        let session = self.session.lock();
        SessionSnapshot {
            state,
            identity: session.as_ref().map(|s| s.identity.clone()),
            has_credential: session.is_some(),
        }
    }
}

impl SessionView for SessionStore {
    fn is_loading(&self) -> bool {
        self.state() == SessionState::Hydrating
    }

    fn is_authenticated(&self) -> bool {
        self.session.lock().is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
