use thiserror::Error;

/// A call into the action gateway failed.
///
/// The outcome of the underlying world action is unknown: it may have partly
/// happened. Callers must not treat this as "nothing changed".
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{action} failed: {reason}")]
    ActionFailed {
        action: &'static str,
        reason: String,
    },
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn failed(action: &'static str, reason: impl Into<String>) -> Self {
        GatewayError::ActionFailed {
            action,
            reason: reason.into(),
        }
    }
}

/// Errors returned by the automation controller
#[derive(Debug, Error)]
pub enum AutomationError {
    /// An internal invariant was broken. This is a bug, not a runtime condition.
    #[error("automation state violation: {0}")]
    StateViolation(String),
    /// A suspend was requested while autowalk is idle
    #[error("autowalk is not running")]
    NotRunning,
}
