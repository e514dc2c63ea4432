//! WorkerLoop - キューから 1 件ずつ受け取って Consumer を呼ぶ
//!
//! # フロー
//! 1. MessageSource::receive() で Delivery + handle を取得
//! 2. 呼び出しごとの子 CancellationToken を作る
//! 3. EnvelopeConsumer::handle() を実行
//! 4. Err ならログだけ出して Abandoned 扱い、handle を drop（再配送はキュー任せ）
//!
//! 並列度は worker の本数だけ。Consumer 側に並行制御はない。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::consumer::EnvelopeConsumer;
use crate::domain::{ConsumerError, Delivery, Settlement};
use crate::ports::{MessageSource, ReceivedMessage, SettlementHandle};

/// Worker group handle.
/// - `request_shutdown()` cancels the shared token: receivers return and
///   in-flight invocations stop before settling.
/// - `shutdown_and_join()` also waits for every worker.
pub struct WorkerGroup {
    cancel: CancellationToken,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(
        n: usize,
        source: Arc<dyn MessageSource>,
        consumer: Arc<EnvelopeConsumer>,
        cancel: CancellationToken,
    ) -> Self {
        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let source = Arc::clone(&source);
            let consumer = Arc::clone(&consumer);
            let cancel = cancel.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, source, consumer, cancel).await;
            }));
        }

        Self { cancel, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn request_shutdown(&self) {
        self.cancel.cancel();
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                error!(error = %err, "worker task failed");
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    source: Arc<dyn MessageSource>,
    consumer: Arc<EnvelopeConsumer>,
    cancel: CancellationToken,
) {
    debug!(worker_id, "worker started");

    while let Some(ReceivedMessage { delivery, handle }) = source.receive(&cancel).await {
        let invocation = cancel.child_token();
        process(worker_id, &consumer, &delivery, handle.as_ref(), &invocation).await;
        // handle drops here; an unsettled message waits for lock expiry
    }

    debug!(worker_id, "worker stopped");
}

/// Run one invocation. Any error leaves the message unsettled: `Abandoned`.
async fn process(
    worker_id: usize,
    consumer: &EnvelopeConsumer,
    delivery: &Delivery,
    handle: &dyn SettlementHandle,
    cancel: &CancellationToken,
) -> Settlement {
    match consumer.handle(delivery, handle, cancel).await {
        Ok(settlement) => {
            debug!(worker_id, message_id = %delivery.message_id(), ?settlement, "message settled");
            settlement
        }
        Err(ConsumerError::Cancelled(message_id)) => {
            info!(worker_id, message_id = %message_id, "invocation cancelled, leaving message for redelivery");
            Settlement::Abandoned
        }
        Err(err) => {
            error!(worker_id, message_id = %delivery.message_id(), error = %err, "message abandoned");
            Settlement::Abandoned
        }
    }
}
