//! Message record: body + broker metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use super::MessageState;
use crate::domain::{DeadLetterReason, Delivery, LockToken, MessageId};

/// Current lock on a message.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lock {
    pub token: LockToken,
    pub expires_at: Instant,
}

/// Everything the broker knows about one message.
///
/// - This is the single source of truth for message state.
/// - The available queue holds MessageIds only.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub message_id: MessageId,

    #[serde(skip)]
    pub body: Vec<u8>,

    pub state: MessageState,

    /// Incremented on every receive.
    pub delivery_count: u32,

    pub enqueued_at: DateTime<Utc>,

    pub dead_letter_reason: Option<DeadLetterReason>,

    pub dead_letter_description: Option<String>,

    #[serde(skip)]
    pub(crate) lock: Option<Lock>,

    /// Lock that settled the message. `None` while unsettled or when the
    /// broker itself dead-lettered it.
    #[serde(skip)]
    pub(crate) settled_by: Option<LockToken>,
}

impl MessageRecord {
    pub fn new(message_id: MessageId, body: Vec<u8>, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            message_id,
            body,
            state: MessageState::Active,
            delivery_count: 0,
            enqueued_at,
            dead_letter_reason: None,
            dead_letter_description: None,
            lock: None,
            settled_by: None,
        }
    }

    /// Peek-lock for a new delivery.
    pub(crate) fn lock(&mut self, token: LockToken, expires_at: Instant) -> Delivery {
        self.state = MessageState::Locked;
        self.delivery_count += 1;
        self.lock = Some(Lock { token, expires_at });
        Delivery::new(
            self.message_id.clone(),
            self.body.clone(),
            self.delivery_count,
            self.enqueued_at,
        )
    }

    /// Is `token` still the live lock at `now`?
    pub(crate) fn holds_lock(&self, token: LockToken, now: Instant) -> bool {
        self.state == MessageState::Locked
            && self
                .lock
                .is_some_and(|lock| lock.token == token && lock.expires_at > now)
    }

    pub(crate) fn lock_expired(&self, now: Instant) -> bool {
        self.state == MessageState::Locked
            && self.lock.is_some_and(|lock| lock.expires_at <= now)
    }

    /// Lock expired: make it receivable again.
    pub(crate) fn release(&mut self) {
        self.state = MessageState::Active;
        self.lock = None;
    }

    /// Did this exact lock settle the message?
    pub(crate) fn settled_with(&self, token: LockToken) -> bool {
        self.state.is_terminal() && self.settled_by == Some(token)
    }

    pub(crate) fn mark_completed(&mut self, token: LockToken) {
        self.state = MessageState::Completed;
        self.lock = None;
        self.settled_by = Some(token);
    }

    pub(crate) fn mark_dead_lettered(
        &mut self,
        reason: DeadLetterReason,
        description: String,
        settled_by: Option<LockToken>,
    ) {
        self.state = MessageState::DeadLettered;
        self.dead_letter_reason = Some(reason);
        self.dead_letter_description = Some(description);
        self.lock = None;
        self.settled_by = settled_by;
    }
}
