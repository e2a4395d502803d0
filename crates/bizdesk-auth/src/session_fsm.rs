//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                ┌─────────────────┐
//!                │    Hydrating    │ (initial)
//!                └────────┬────────┘
//!      NoSession          │          SessionRestored
//!         ┌───────────────┴───────────────┐
//!         ▼                               ▼
//! ┌─────────────────┐  LoginSuccess  ┌─────────────────┐
//! │    SignedOut    │◄──┐       ┌───►│    SignedIn     │◄─────────────┐
//! └──┬──────────┬───┘   │       │    └──┬─────┬─────┬──┘              │
//!    │          │       │       │       │     │     │ LoginAttempt    │
//!    │ LoginAttempt     │       │       │     │     ▼                 │
//!    │          ▼       │       │       │     │  Reauthenticating ────┤
//!    │     SigningIn ───┴─Failed│       │     │  (Success or Failed)  │
//!    │          └───────────────┘       │     │                       │
//!    │                                  │     │ VerifyRequested       │
//!    │ LogoutRequested  LogoutRequested │     ▼                       │
//!    │          ┌───────────────────────┘  Verifying ── Verified ─────┘
//!    ▼          ▼                             │         Inconclusive
//! ┌─────────────────┐                         │ ServerRejected
//! │   SigningOut    │── LogoutComplete ──►  SignedOut
//! └─────────────────┘
//! ```
//!
//! Not drawn: `LogoutRequested` also leads to `SigningOut` from the in-flight
//! states (`SigningIn`, `Reauthenticating`, `Verifying`), and `SaveFailed`
//! leads from either login state to `SignedOut` when the new session could
//! not be stored and the old one did not survive.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Hydrating)

    Hydrating => {
        SessionRestored => SignedIn,
        NoSession => SignedOut
    },
    SignedOut => {
        LoginAttempt => SigningIn,
        // Logout is idempotent
        LogoutRequested => SigningOut
    },
    SigningIn => {
        LoginSuccess => SignedIn,
        LoginFailed => SignedOut,
        SaveFailed => SignedOut,
        LogoutRequested => SigningOut
    },
    SignedIn => {
        LoginAttempt => Reauthenticating,
        LogoutRequested => SigningOut,
        VerifyRequested => Verifying
    },
    Reauthenticating => {
        LoginSuccess => SignedIn,
        // The previous session is still in place
        LoginFailed => SignedIn,
        SaveFailed => SignedOut,
        LogoutRequested => SigningOut
    },
    Verifying => {
        ServerVerified => SignedIn,
        // Network or server error: keep the session, nothing was learned
        VerifyInconclusive => SignedIn,
        ServerRejected => SignedOut,
        LogoutRequested => SigningOut
    },
    SigningOut => {
        LogoutComplete => SignedOut
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Reading persisted storage (the loading flag).
    Hydrating,
    /// No session.
    SignedOut,
    /// Login request in flight, no previous session.
    SigningIn,
    /// Login request in flight over an existing session.
    Reauthenticating,
    /// Session present.
    SignedIn,
    /// Checking the stored credential with the server.
    Verifying,
    /// Clearing the session.
    SigningOut,
}

impl SessionState {
    /// Returns true while a session identity is held.
    pub fn has_session(&self) -> bool {
        matches!(
            self,
            SessionState::SignedIn | SessionState::Reauthenticating | SessionState::Verifying
        )
    }

    /// Returns true if the state is a transient/in-progress state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::Hydrating
                | SessionState::SigningIn
                | SessionState::Reauthenticating
                | SessionState::Verifying
                | SessionState::SigningOut
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Hydrating => SessionState::Hydrating,
            SessionMachineState::SignedOut => SessionState::SignedOut,
            SessionMachineState::SigningIn => SessionState::SigningIn,
            SessionMachineState::Reauthenticating => SessionState::Reauthenticating,
            SessionMachineState::SignedIn => SessionState::SignedIn,
            SessionMachineState::Verifying => SessionState::Verifying,
            SessionMachineState::SigningOut => SessionState::SigningOut,
        }
    }
}

/// Payload for session state change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionChanged {
    /// New state.
    pub state: SessionState,
    /// Email of the in-memory identity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
