//! Errors - レイヤーごとのエラー型
//!
//! # 分類
//! - DecodeError: body が構造化データとして読めない → dead-letter（ローカルで回復）
//! - SinkError / ConsumerError::Processing: decode 後の失敗 → settle せず呼び出し元へ（abandon）
//! - SettlementError: complete / dead-letter 自体の失敗 → リトライせず呼び出し元へ

use thiserror::Error;

use super::ids::MessageId;

/// The body could not be turned into a `MailEnvelope`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("body is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("body is a JSON {found}, expected an object")]
    NotAnObject { found: &'static str },

    #[error("envelope field has an unexpected type: {0}")]
    Field(#[source] serde_json::Error),
}

/// The observability sink refused a line.
#[derive(Debug, Clone, Error)]
#[error("log sink failed: {0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("message {0} is already settled")]
    AlreadySettled(MessageId),

    #[error("lock on message {0} was lost")]
    LockLost(MessageId),

    #[error("message {0} not found")]
    NotFound(MessageId),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

/// Failures that leave the message unsettled for redelivery.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("processing failed: {0}")]
    Processing(#[from] SinkError),

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("invocation for message {0} was cancelled before settlement")]
    Cancelled(MessageId),
}
