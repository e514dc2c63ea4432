//! Settlement outcomes and dead-letter reason codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a message ended up in the dead-letter sub-queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadLetterReason {
    /// The consumer could not decode the body. Used for every decode failure.
    InvalidFormat,

    /// The broker gave up after the maximum number of deliveries.
    MaxDeliveryCountExceeded,
}

impl DeadLetterReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DeadLetterReason::InvalidFormat => "InvalidFormat",
            DeadLetterReason::MaxDeliveryCountExceeded => "MaxDeliveryCountExceeded",
        }
    }
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one consumer invocation did with its message.
///
/// `Abandoned` is never produced by an explicit settlement call. The worker
/// reports it when an invocation fails and the handle is dropped unsettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Settlement {
    Completed,
    DeadLettered {
        reason: DeadLetterReason,
        description: String,
    },
    Abandoned,
}
