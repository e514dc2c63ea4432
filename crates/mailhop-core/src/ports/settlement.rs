//! SettlementHandle port - 配送されたメッセージの lease
//!
//! Consumer は message を所有しない。1 回の呼び出しの間だけ handle を借りて、
//! complete / dead_letter のどちらか一方を呼ぶか、何も呼ばずに手放す（abandon）。

use async_trait::async_trait;

use crate::domain::{DeadLetterReason, SettlementError};

/// Settlement actions for one delivered message.
///
/// Implementations must tolerate a second call on the same handle by
/// returning `SettlementError::AlreadySettled` rather than panicking.
#[async_trait]
pub trait SettlementHandle: Send + Sync {
    /// Mark the message as successfully processed.
    async fn complete(&self) -> Result<(), SettlementError>;

    /// Move the message to the dead-letter sub-queue. It will not be redelivered.
    async fn dead_letter(
        &self,
        reason: DeadLetterReason,
        description: &str,
    ) -> Result<(), SettlementError>;
}
