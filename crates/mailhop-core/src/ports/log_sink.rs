//! LogSink port - Consumer の観測ログの出口
//!
//! 1 メッセージにつき出す行は決まっている（テストで数を数えるため）：
//! - 到着時: `Arrival`
//! - decode 成功時: 存在するフィールドごとに `Field`
//! - decode 失敗時: `DecodeFailed`（warning）
//! - settle 後: `Completed` または `DeadLettered`

use std::fmt;

use crate::domain::{DeadLetterReason, DecodeError, EnvelopeField, MessageId, SinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

/// One structured observability line.
#[derive(Debug)]
pub enum LogLine<'a> {
    Arrival {
        message_id: &'a MessageId,
        delivery_count: u32,
    },
    Field {
        message_id: &'a MessageId,
        field: EnvelopeField,
        value: &'a str,
    },
    DecodeFailed {
        message_id: &'a MessageId,
        error: &'a DecodeError,
    },
    Completed {
        message_id: &'a MessageId,
    },
    DeadLettered {
        message_id: &'a MessageId,
        reason: DeadLetterReason,
    },
}

impl LogLine<'_> {
    pub fn level(&self) -> LogLevel {
        match self {
            LogLine::DecodeFailed { .. } => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        match self {
            LogLine::Arrival { message_id, .. }
            | LogLine::Field { message_id, .. }
            | LogLine::DecodeFailed { message_id, .. }
            | LogLine::Completed { message_id }
            | LogLine::DeadLettered { message_id, .. } => *message_id,
        }
    }
}

impl fmt::Display for LogLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLine::Arrival { message_id, .. } => write!(f, "Processing message: {message_id}"),
            LogLine::Field { field, value, .. } => write!(f, "{field}: {value}"),
            LogLine::DecodeFailed { message_id, error } => {
                write!(f, "Failed to deserialize message {message_id}: {error}")
            }
            LogLine::Completed { message_id } => {
                write!(f, "Message {message_id} processed successfully")
            }
            LogLine::DeadLettered { message_id, reason } => {
                write!(f, "Message {message_id} dead-lettered ({reason})")
            }
        }
    }
}

/// Where consumer log lines go.
///
/// An error from `emit` before settlement makes the consumer abandon the
/// message.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &LogLine<'_>) -> Result<(), SinkError>;
}
