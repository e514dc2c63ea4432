//! Queue policy: lock duration and redelivery limit.
//!
//! Redelivery lives here, in the broker. The consumer never retries.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct QueuePolicy {
    /// How long a received message stays invisible to other receivers.
    pub lock_duration: Duration,

    /// Deliveries allowed before an expiring lock dead-letters the message.
    pub max_delivery_count: u32,
}

impl QueuePolicy {
    pub fn new(lock_duration: Duration, max_delivery_count: u32) -> Self {
        Self {
            lock_duration,
            // 0 would dead-letter before the first delivery
            max_delivery_count: max_delivery_count.max(1),
        }
    }
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 10)
    }
}
