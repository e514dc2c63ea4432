//! TracingSink - LogLine を tracing のイベントとして出す（本番用のデフォルト）

use tracing::{info, warn};

use crate::domain::SinkError;
use crate::ports::{LogLine, LogSink};

/// Forwards consumer lines to the process-wide `tracing` subscriber.
///
/// Never fails: shipping the events is the subscriber's problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, line: &LogLine<'_>) -> Result<(), SinkError> {
        match line {
            LogLine::Arrival {
                message_id,
                delivery_count,
            } => info!(message_id = %message_id, delivery_count, "{line}"),
            LogLine::Field {
                message_id, field, ..
            } => info!(message_id = %message_id, field = field.label(), "{line}"),
            LogLine::DecodeFailed { message_id, error } => {
                warn!(message_id = %message_id, error = %error, "{line}")
            }
            LogLine::Completed { message_id } => info!(message_id = %message_id, "{line}"),
            LogLine::DeadLettered { message_id, reason } => {
                info!(message_id = %message_id, reason = reason.as_str(), "{line}")
            }
        }
        Ok(())
    }
}
