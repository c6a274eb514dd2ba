//! Errors surfaced by the editing session.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::model::SessionId;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The operation is not available on the current screen.
    #[error("Invalid state: expected {expected}, currently {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("No active session")]
    NoActiveSession,

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("No authorization is pending")]
    NoPendingAuthorization,

    #[error("Invalid rotation delta: {0}")]
    InvalidRotation(f64),

    /// A blocking gateway task panicked or was cancelled.
    #[error("Background worker failed: {0}")]
    Worker(String),
}
