//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（時刻は Clock から取る）

use ulid::Ulid;

use crate::domain::{LockToken, MessageId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_message_id(&self) -> MessageId;

    fn generate_lock_token(&self) -> LockToken;
}

/// ULID generator. The timestamp half comes from `C`, the rest is random,
/// so a `FixedClock` still yields distinct ids.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_message_id(&self) -> MessageId {
        MessageId::from(self.next_ulid())
    }

    fn generate_lock_token(&self) -> LockToken {
        LockToken::from_ulid(self.next_ulid())
    }
}
