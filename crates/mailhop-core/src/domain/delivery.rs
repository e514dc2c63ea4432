//! Delivery - 1 回の配送で Consumer に渡されるもの

use chrono::{DateTime, Utc};

use super::ids::MessageId;

/// One delivery of a queued message: identifier, raw body and broker metadata.
///
/// The body is opaque bytes; no size limit is enforced here.
#[derive(Debug, Clone)]
pub struct Delivery {
    message_id: MessageId,
    body: Vec<u8>,
    delivery_count: u32,
    enqueued_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(
        message_id: MessageId,
        body: impl Into<Vec<u8>>,
        delivery_count: u32,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            body: body.into(),
            delivery_count,
            enqueued_at,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 1 on first delivery.
    pub fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}
