//! EnvelopeConsumer - 1 メッセージを decode・ログ・settle する
//!
//! # 状態遷移
//! - Received → Validated → Completed
//! - Received → DeadLettered（decode 失敗、reason = InvalidFormat）
//! - どこからでも → Abandoned（sink の失敗・キャンセル。settle は呼ばない）
//!
//! 呼び出しをまたぐ状態は持たないので、別メッセージの並行処理はそのまま安全。
//! リトライもしない。再配送はキューの lock expiry に任せる。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::decode_envelope;
use crate::domain::{
    ConsumerError, DeadLetterReason, DecodeError, Delivery, MessageId, Settlement,
    SettlementError,
};
use crate::ports::{LogLine, LogSink, SettlementHandle};

pub struct EnvelopeConsumer {
    sink: Arc<dyn LogSink>,
}

impl EnvelopeConsumer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Process one delivery and settle it through `handle`.
    ///
    /// Returns `Completed` or `DeadLettered` once settled. Every `Err` means
    /// no settlement call was made, or the one made failed; either way the
    /// message is left to the queue's lock expiry.
    #[tracing::instrument(
        name = "consume",
        skip_all,
        fields(message_id = %delivery.message_id(), delivery_count = delivery.delivery_count())
    )]
    pub async fn handle(
        &self,
        delivery: &Delivery,
        handle: &dyn SettlementHandle,
        cancel: &CancellationToken,
    ) -> Result<Settlement, ConsumerError> {
        let message_id = delivery.message_id();
        self.sink.emit(&LogLine::Arrival {
            message_id,
            delivery_count: delivery.delivery_count(),
        })?;

        let envelope = match decode_envelope(delivery.body()) {
            Ok(envelope) => envelope,
            Err(error) => return self.reject(message_id, &error, handle, cancel).await,
        };

        for (field, value) in envelope.populated_fields() {
            self.sink.emit(&LogLine::Field {
                message_id,
                field,
                value,
            })?;
        }

        ensure_live(message_id, cancel)?;
        accept_settlement(handle.complete().await)?;
        self.emit_after_settlement(&LogLine::Completed { message_id });

        Ok(Settlement::Completed)
    }

    async fn reject(
        &self,
        message_id: &MessageId,
        error: &DecodeError,
        handle: &dyn SettlementHandle,
        cancel: &CancellationToken,
    ) -> Result<Settlement, ConsumerError> {
        self.sink.emit(&LogLine::DecodeFailed { message_id, error })?;

        let reason = DeadLetterReason::InvalidFormat;
        let description = format!("Failed to deserialize email envelope: {error}");

        ensure_live(message_id, cancel)?;
        accept_settlement(handle.dead_letter(reason, &description).await)?;
        self.emit_after_settlement(&LogLine::DeadLettered { message_id, reason });

        Ok(Settlement::DeadLettered {
            reason,
            description,
        })
    }

    /// The message is settled by now, so a sink failure can no longer
    /// abandon it.
    fn emit_after_settlement(&self, line: &LogLine<'_>) {
        if let Err(err) = self.sink.emit(line) {
            warn!(message_id = %line.message_id(), error = %err, "log sink failed after settlement");
        }
    }
}

fn ensure_live(message_id: &MessageId, cancel: &CancellationToken) -> Result<(), ConsumerError> {
    if cancel.is_cancelled() {
        return Err(ConsumerError::Cancelled(message_id.clone()));
    }
    Ok(())
}

/// A repeat settlement is a no-op. Anything else is fatal to the invocation.
fn accept_settlement(result: Result<(), SettlementError>) -> Result<(), ConsumerError> {
    match result {
        Ok(()) => Ok(()),
        Err(SettlementError::AlreadySettled(message_id)) => {
            debug!(message_id = %message_id, "message already settled, ignoring");
            Ok(())
        }
        Err(err) => Err(ConsumerError::Settlement(err)),
    }
}
