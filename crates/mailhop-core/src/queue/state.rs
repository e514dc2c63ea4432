//! Message state machine for the in-memory broker.

use serde::{Deserialize, Serialize};

/// Message state.
///
/// State transitions:
/// - Active -> Locked -> Completed
/// - Active -> Locked -> DeadLettered (consumer dead-letters it)
/// - Active -> Locked -> Active (lock expired, delivery count below max)
/// - Active -> Locked -> DeadLettered (lock expired, max delivery count reached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageState {
    /// Waiting to be received.
    Active,

    /// Peek-locked by a consumer.
    Locked,

    /// Settled successfully.
    Completed,

    /// Moved to the dead-letter sub-queue.
    DeadLettered,
}

impl MessageState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageState::Completed | MessageState::DeadLettered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_states_are_terminal() {
        assert!(MessageState::Completed.is_terminal());
        assert!(MessageState::DeadLettered.is_terminal());
        assert!(!MessageState::Active.is_terminal());
        assert!(!MessageState::Locked.is_terminal());
    }
}
