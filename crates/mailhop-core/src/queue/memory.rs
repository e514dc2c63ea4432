//! In-memory queue implementation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{MessageRecord, MessageState, QueueCounts, QueuePolicy};
use crate::domain::{DeadLetterReason, LockToken, MessageId, SettlementError};
use crate::ports::{
    Clock, IdGenerator, MessageSource, ReceivedMessage, SettlementHandle, SystemClock,
    UlidGenerator,
};

/// What a handle asks the broker to do.
enum Disposition<'a> {
    Complete,
    DeadLetter {
        reason: DeadLetterReason,
        description: &'a str,
    },
}

/// In-memory queue state.
struct InMemoryQueueState {
    /// All message records (single source of truth).
    records: HashMap<MessageId, MessageRecord>,

    /// Receivable messages (MessageIds only).
    available: VecDeque<MessageId>,

    /// Messages currently under a peek-lock. Expiry scans only look here.
    locked: HashSet<MessageId>,

    /// Dead-letter sub-queue, in the order messages arrived there.
    dead_letters: Vec<MessageId>,

    policy: QueuePolicy,
}

impl InMemoryQueueState {
    fn new(policy: QueuePolicy) -> Self {
        Self {
            records: HashMap::new(),
            available: VecDeque::new(),
            locked: HashSet::new(),
            dead_letters: Vec::new(),
            policy,
        }
    }

    /// Return expired locks to the queue, or dead-letter them once the
    /// delivery budget is spent.
    fn reclaim_expired(&mut self, now: Instant) {
        let expired: Vec<MessageId> = self
            .locked
            .iter()
            .filter(|id| self.records.get(*id).is_some_and(|r| r.lock_expired(now)))
            .cloned()
            .collect();

        for message_id in expired {
            self.locked.remove(&message_id);
            let Some(record) = self.records.get_mut(&message_id) else {
                continue;
            };

            if record.delivery_count >= self.policy.max_delivery_count {
                let description = format!(
                    "Message could not be consumed after {} delivery attempts.",
                    record.delivery_count
                );
                info!(
                    message_id = %message_id,
                    delivery_count = record.delivery_count,
                    "max delivery count reached, dead-lettering"
                );
                record.mark_dead_lettered(
                    DeadLetterReason::MaxDeliveryCountExceeded,
                    description,
                    None,
                );
                self.dead_letters.push(message_id);
            } else {
                debug!(message_id = %message_id, "lock expired, message available again");
                record.release();
                self.available.push_back(message_id);
            }
        }
    }

    fn next_lock_expiry(&self) -> Option<Instant> {
        self.locked
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter_map(|record| record.lock.map(|lock| lock.expires_at))
            .min()
    }

    fn settle(
        &mut self,
        message_id: &MessageId,
        token: LockToken,
        disposition: Disposition<'_>,
    ) -> Result<(), SettlementError> {
        let now = Instant::now();
        let record = self
            .records
            .get_mut(message_id)
            .ok_or_else(|| SettlementError::NotFound(message_id.clone()))?;

        // AlreadySettled は同じ lock で settle 済みのときだけ
        if record.settled_with(token) {
            return Err(SettlementError::AlreadySettled(message_id.clone()));
        }
        if !record.holds_lock(token, now) {
            return Err(SettlementError::LockLost(message_id.clone()));
        }

        match disposition {
            Disposition::Complete => record.mark_completed(token),
            Disposition::DeadLetter {
                reason,
                description,
            } => {
                record.mark_dead_lettered(reason, description.to_string(), Some(token));
                self.dead_letters.push(message_id.clone());
            }
        }
        self.locked.remove(message_id);
        Ok(())
    }

    fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in self.records.values() {
            match record.state {
                MessageState::Active => counts.active += 1,
                MessageState::Locked => counts.locked += 1,
                MessageState::Completed => counts.completed += 1,
                MessageState::DeadLettered => counts.dead_lettered += 1,
            }
        }
        counts
    }
}

/// In-memory queue with peek-lock delivery.
pub struct InMemoryQueue {
    state: Arc<Mutex<InMemoryQueueState>>,
    notify: Arc<Notify>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self::with_parts(
            policy,
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    /// Build with an explicit clock and id source (tests pin these).
    pub fn with_parts(
        policy: QueuePolicy,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryQueueState::new(policy))),
            notify: Arc::new(Notify::new()),
            clock,
            ids,
        }
    }

    /// Enqueue a raw body. This is the producer side of the queue.
    pub async fn send(&self, body: impl Into<Vec<u8>>) -> MessageId {
        let message_id = self.ids.generate_message_id();
        let record = MessageRecord::new(message_id.clone(), body.into(), self.clock.now());
        {
            let mut state = self.state.lock().await;
            state.records.insert(message_id.clone(), record);
            state.available.push_back(message_id.clone());
        }
        // Notify outside the lock
        self.notify.notify_one();
        message_id
    }

    pub async fn counts(&self) -> QueueCounts {
        let mut state = self.state.lock().await;
        state.reclaim_expired(Instant::now());
        state.counts()
    }

    pub async fn status(&self, message_id: &MessageId) -> Option<MessageRecord> {
        let mut state = self.state.lock().await;
        state.reclaim_expired(Instant::now());
        state.records.get(message_id).cloned()
    }

    /// Dead-letter sub-queue contents, oldest first.
    pub async fn dead_letters(&self) -> Vec<MessageRecord> {
        let mut state = self.state.lock().await;
        state.reclaim_expired(Instant::now());
        state
            .dead_letters
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }
}

#[async_trait]
impl MessageSource for InMemoryQueue {
    async fn receive(&self, cancel: &CancellationToken) -> Option<ReceivedMessage> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let next_wake = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                state.reclaim_expired(now);

                let lock_duration = state.policy.lock_duration;
                if let Some(message_id) = state.available.pop_front()
                    && let Some(record) = state.records.get_mut(&message_id)
                {
                    let token = self.ids.generate_lock_token();
                    let delivery = record.lock(token, now + lock_duration);
                    state.locked.insert(message_id.clone());
                    let handle = InMemoryHandle {
                        message_id,
                        token,
                        queue: Arc::clone(&self.state),
                    };
                    return Some(ReceivedMessage {
                        delivery,
                        handle: Box::new(handle),
                    });
                }

                // Nothing available - wake up when the next lock can expire
                state.next_lock_expiry()
            };

            if let Some(wake_at) = next_wake {
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = self.notify.notified() => {},
                    _ = tokio::time::sleep_until(wake_at) => {},
                }
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = self.notify.notified() => {},
                }
            }
        }
    }
}

/// Handle bound to one peek-lock.
struct InMemoryHandle {
    message_id: MessageId,
    token: LockToken,
    queue: Arc<Mutex<InMemoryQueueState>>,
}

#[async_trait]
impl SettlementHandle for InMemoryHandle {
    async fn complete(&self) -> Result<(), SettlementError> {
        let mut state = self.queue.lock().await;
        state.settle(&self.message_id, self.token, Disposition::Complete)
    }

    async fn dead_letter(
        &self,
        reason: DeadLetterReason,
        description: &str,
    ) -> Result<(), SettlementError> {
        let mut state = self.queue.lock().await;
        state.settle(
            &self.message_id,
            self.token,
            Disposition::DeadLetter {
                reason,
                description,
            },
        )
    }
}
