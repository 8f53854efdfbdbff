//! Protocol session state machine

/// State of a single command exchange
///
/// # State Transitions
/// ```text
/// Idle -> AwaitingAck            (command frame written)
/// AwaitingAck -> AwaitingAck     (timeout/NAK, frame resent)
/// AwaitingAck -> AwaitingData    (ACK or frame start for a data command)
/// AwaitingAck -> Idle            (ACK for an acknowledge-only command)
/// AwaitingData -> AwaitingAck    (bad data frame, request re-issued)
/// AwaitingData -> Idle           (data frame decoded)
/// any -> Error                   (retries exhausted or fatal failure)
/// Error -> Idle                  (failure reported to the caller)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No command outstanding
    #[default]
    Idle,
    /// Command frame written, waiting for ACK, NAK or a frame start
    AwaitingAck,
    /// Waiting for the data frame of a data command
    AwaitingData,
    /// The exchange failed and is being torn down
    Error,
}

impl SessionState {
    /// Check if a new command may be started
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Check if an exchange is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::AwaitingAck | SessionState::AwaitingData)
    }

    /// Check whether moving to `new_state` is a legal transition
    pub fn can_transition_to(&self, new_state: SessionState) -> bool {
        matches!(
            (*self, new_state),
            (SessionState::Idle, SessionState::AwaitingAck)
                | (SessionState::AwaitingAck, SessionState::AwaitingAck)
                | (SessionState::AwaitingAck, SessionState::AwaitingData)
                | (SessionState::AwaitingAck, SessionState::Idle)
                | (SessionState::AwaitingData, SessionState::AwaitingAck)
                | (SessionState::AwaitingData, SessionState::Idle)
                | (_, SessionState::Error)
                | (SessionState::Error, SessionState::Idle)
        )
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::AwaitingAck => "AwaitingAck",
            SessionState::AwaitingData => "AwaitingData",
            SessionState::Error => "Error",
        }
    }
}
