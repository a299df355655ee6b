//! The session state machine as a pure transition function.

use coachroom_types::LifecycleState;

/// Inputs to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// User asked to start a session.
    Start,
    /// The room connection was established.
    Connected,
    /// The room connection could not be established.
    ConnectFailed,
    /// A deadline passed: the connect timeout while connecting, or the
    /// session duration bound while active.
    Timeout,
    /// User asked to leave.
    Leave,
    /// The transport dropped an active connection.
    TransportError,
}

/// Returns the state after `event`, or `None` if the event is not defined
/// for `state`. Undefined transitions are no-ops; `Ended` accepts nothing.
pub fn next_state(state: LifecycleState, event: SessionEvent) -> Option<LifecycleState> {
    use LifecycleState::*;
    use SessionEvent::*;

    match (state, event) {
        (Idle, Start) => Some(Connecting),
        (Connecting, Connected) => Some(Active),
        (Connecting, ConnectFailed | Timeout | Leave) => Some(Ended),
        (Active, Leave | Timeout | TransportError) => Some(Ended),
        _ => None,
    }
}
