//! MessageSource port - 1 件ずつ配送するキューの受信側

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::settlement::SettlementHandle;
use crate::domain::Delivery;

/// A delivery together with the handle that settles it.
///
/// Dropping `handle` without calling it abandons the message; the queue's
/// lock expiry brings it back.
pub struct ReceivedMessage {
    pub delivery: Delivery,
    pub handle: Box<dyn SettlementHandle>,
}

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message. Returns `None` once `cancel` fires.
    async fn receive(&self, cancel: &CancellationToken) -> Option<ReceivedMessage>;
}
