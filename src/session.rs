use crate::types::Node;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// The one account the mock credential check accepts.
pub const DEMO_EMAIL: &str = "test@test.com";
pub const DEMO_PASSWORD: &str = "password";

/// Artificial handshake delay; there is no real tunnel behind it.
pub const CONNECT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,
    #[error("operation not valid in the current session state")]
    InvalidTransition,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    SignedOut,
    NodeSelection,
    Connecting(Node),
    Connected(Node),
}

/// One second of simulated connection readout.
#[derive(Clone, Debug)]
pub struct ConnectionStats {
    pub duration_secs: u64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl ConnectionStats {
    pub fn duration_display(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Owns the SignedOut -> NodeSelection -> Connecting -> Connected transitions.
///
/// Connecting always completes; no timeout, retry, or cancellation is
/// modeled. The handshake delay is injectable so tests can shrink it.
pub struct SessionController {
    state: SessionState,
    connect_delay: Duration,
    duration_secs: u64,
}

impl SessionController {
    pub fn new() -> Self {
        Self::with_connect_delay(CONNECT_DELAY)
    }

    pub fn with_connect_delay(connect_delay: Duration) -> Self {
        Self {
            state: SessionState::SignedOut,
            connect_delay,
            duration_secs: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Exact literal match against the demo account. No hashing, no lockout;
    /// a failure is recoverable and shown inline by the caller.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        if self.state != SessionState::SignedOut {
            return Err(SessionError::InvalidTransition);
        }
        if email == DEMO_EMAIL && password == DEMO_PASSWORD {
            self.state = SessionState::NodeSelection;
            Ok(())
        } else {
            Err(SessionError::InvalidCredentials)
        }
    }

    /// Enter Connecting and hand back the handshake delay for the caller's
    /// timer. Only valid from the selection screen.
    pub fn begin_connect(&mut self, node: Node) -> Result<Duration, SessionError> {
        if self.state != SessionState::NodeSelection {
            return Err(SessionError::InvalidTransition);
        }
        self.state = SessionState::Connecting(node);
        Ok(self.connect_delay)
    }

    /// Fires when the handshake timer elapses; always succeeds.
    pub fn complete_connect(&mut self) -> Result<Node, SessionError> {
        match std::mem::replace(&mut self.state, SessionState::SignedOut) {
            SessionState::Connecting(node) => {
                self.duration_secs = 0;
                self.state = SessionState::Connected(node.clone());
                Ok(node)
            }
            other => {
                self.state = other;
                Err(SessionError::InvalidTransition)
            }
        }
    }

    /// Back to the selection screen; the per-second tick goes quiet.
    pub fn disconnect(&mut self) -> Result<Node, SessionError> {
        match std::mem::replace(&mut self.state, SessionState::SignedOut) {
            SessionState::Connected(node) => {
                self.state = SessionState::NodeSelection;
                Ok(node)
            }
            other => {
                self.state = other;
                Err(SessionError::InvalidTransition)
            }
        }
    }

    /// Advance the connection clock one second and roll fresh fake speeds.
    /// Returns None in every state but Connected.
    pub fn tick(&mut self) -> Option<ConnectionStats> {
        if !matches!(self.state, SessionState::Connected(_)) {
            return None;
        }
        self.duration_secs += 1;

        let mut rng = rand::thread_rng();
        Some(ConnectionStats {
            duration_secs: self.duration_secs,
            download_mbps: 85.31 + rng.gen_range(-5.5..=5.5),
            upload_mbps: 22.19 + rng.gen_range(-2.5..=2.5),
        })
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
