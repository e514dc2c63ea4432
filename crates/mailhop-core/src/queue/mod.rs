//! Queue module: an in-memory stand-in for the managed message queue.
//!
//! Peek-lock delivery, lock expiry, delivery counting and the dead-letter
//! sub-queue live here. The consumer only ever sees the ports.

mod memory;
mod policy;
mod record;
mod state;

pub use memory::InMemoryQueue;
pub use policy::QueuePolicy;
pub use record::MessageRecord;
pub use state::MessageState;

use serde::{Deserialize, Serialize};

/// Message counts by state, for operators and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub active: usize,
    pub locked: usize,
    pub completed: usize,
    pub dead_lettered: usize,
}

impl QueueCounts {
    /// Nothing left to deliver or settle.
    pub fn is_drained(&self) -> bool {
        self.active == 0 && self.locked == 0
    }
}
