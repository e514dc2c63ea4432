//! End-to-end behaviour of the envelope consumer: decode, observability lines,
//! and settlement, both against a recording handle and the in-memory queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use mailhop_core::domain::SettlementError;
use mailhop_core::impls::MemorySink;
use mailhop_core::ports::{LogLevel, MessageSource, SettlementHandle};
use mailhop_core::queue::{InMemoryQueue, MessageState, QueuePolicy};
use mailhop_core::{
    ConsumerError, DeadLetterReason, Delivery, EnvelopeConsumer, MessageId, Settlement,
    WorkerGroup, decode_envelope,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Complete,
    DeadLetter(DeadLetterReason, String),
}

/// Records every settlement call made on it.
#[derive(Default)]
struct RecordingHandle {
    calls: Mutex<Vec<Call>>,
}

impl RecordingHandle {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn completes(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Complete).count()
    }

    fn dead_letters(&self) -> Vec<(DeadLetterReason, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeadLetter(reason, description) => Some((reason, description)),
                Call::Complete => None,
            })
            .collect()
    }
}

#[async_trait]
impl SettlementHandle for RecordingHandle {
    async fn complete(&self) -> Result<(), SettlementError> {
        self.calls.lock().unwrap().push(Call::Complete);
        Ok(())
    }

    async fn dead_letter(
        &self,
        reason: DeadLetterReason,
        description: &str,
    ) -> Result<(), SettlementError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::DeadLetter(reason, description.to_string()));
        Ok(())
    }
}

fn delivery(body: impl Into<Vec<u8>>) -> Delivery {
    Delivery::new(MessageId::new("msg-test"), body, 1, Utc::now())
}

async fn consume(
    body: impl Into<Vec<u8>>,
    sink: Arc<MemorySink>,
) -> (Result<Settlement, ConsumerError>, RecordingHandle) {
    let consumer = EnvelopeConsumer::new(sink);
    let handle = RecordingHandle::default();
    let result = consumer
        .handle(&delivery(body), &handle, &CancellationToken::new())
        .await;
    (result, handle)
}

const FULL_BODY: &str = r#"{"subject":"Hi","from":"a@b.com","receivedAt":"2026-02-02T10:00:00Z","bodyPreview":"Hello world"}"#;

#[test]
fn decoding_same_body_twice_is_identical() {
    let first = decode_envelope(FULL_BODY.as_bytes()).unwrap();
    let second = decode_envelope(FULL_BODY.as_bytes()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn malformed_body_is_dead_lettered_once_and_never_completed() {
    let sink = Arc::new(MemorySink::new());
    let (result, handle) = consume("not-json{", sink.clone()).await;

    assert!(matches!(
        result,
        Ok(Settlement::DeadLettered { reason: DeadLetterReason::InvalidFormat, .. })
    ));
    assert_eq!(handle.completes(), 0);
    let dead = handle.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].0.as_str(), "InvalidFormat");

    let warnings: Vec<_> = sink
        .lines()
        .into_iter()
        .filter(|l| l.level == LogLevel::Warn)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("msg-test"));
}

#[tokio::test]
async fn full_envelope_is_completed_once() {
    let sink = Arc::new(MemorySink::new());
    let (result, handle) = consume(FULL_BODY, sink.clone()).await;

    assert_eq!(result.unwrap(), Settlement::Completed);
    assert_eq!(handle.calls(), vec![Call::Complete]);
    assert_eq!(
        sink.texts(),
        vec![
            "Processing message: msg-test",
            "Subject: Hi",
            "From: a@b.com",
            "Received: 2026-02-02T10:00:00Z",
            "Preview: Hello world",
            "Message msg-test processed successfully",
        ]
    );
}

#[tokio::test]
async fn long_preview_is_truncated_in_the_log_only() {
    let preview: String = ('a'..='z').cycle().take(250).collect();
    let body = format!(r#"{{"bodyPreview":"{preview}"}}"#);

    let envelope = decode_envelope(body.as_bytes()).unwrap();
    assert_eq!(envelope.body_preview().map(|p| p.chars().count()), Some(250));

    let sink = Arc::new(MemorySink::new());
    let (result, _) = consume(body, sink.clone()).await;
    assert_eq!(result.unwrap(), Settlement::Completed);

    let line = sink
        .texts()
        .into_iter()
        .find(|t| t.starts_with("Preview: "))
        .expect("preview line");
    let logged = line.trim_start_matches("Preview: ");
    assert_eq!(logged.chars().count(), 100);
    assert_eq!(logged, &preview[..100]);
}

#[tokio::test]
async fn never_both_completes_and_dead_letters() {
    for body in [FULL_BODY, "{}", "not-json{", "[1]", r#"{"subject":7}"#, ""] {
        let (_, handle) = consume(body, Arc::new(MemorySink::new())).await;
        let calls = handle.calls();
        assert_eq!(calls.len(), 1, "body {body:?} produced {calls:?}");
    }
}

#[tokio::test]
async fn sink_failure_after_decode_abandons_the_message() {
    // line 0 is the arrival, line 1 is the first field
    let sink = Arc::new(MemorySink::failing_at(1));
    let (result, handle) = consume(FULL_BODY, sink).await;

    assert!(matches!(result, Err(ConsumerError::Processing(_))));
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn sink_failure_on_decode_warning_abandons_too() {
    let sink = Arc::new(MemorySink::failing_at(1));
    let (result, handle) = consume("not-json{", sink).await;

    assert!(matches!(result, Err(ConsumerError::Processing(_))));
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn empty_object_completes_with_no_field_lines() {
    let sink = Arc::new(MemorySink::new());
    let (result, handle) = consume("{}", sink.clone()).await;

    assert_eq!(result.unwrap(), Settlement::Completed);
    assert_eq!(handle.completes(), 1);
    assert_eq!(
        sink.texts(),
        vec![
            "Processing message: msg-test",
            "Message msg-test processed successfully",
        ]
    );
}

#[tokio::test]
async fn subject_only_logs_just_the_subject_field() {
    let sink = Arc::new(MemorySink::new());
    let (result, handle) = consume(r#"{"subject":"Test"}"#, sink.clone()).await;

    assert_eq!(result.unwrap(), Settlement::Completed);
    assert_eq!(handle.completes(), 1);
    assert_eq!(sink.count_starting_with("Subject: "), 1);
    assert_eq!(sink.count_starting_with("From: "), 0);
    assert_eq!(sink.count_starting_with("Received: "), 0);
    assert_eq!(sink.count_starting_with("Preview: "), 0);
}

#[tokio::test]
async fn cancellation_leaves_message_for_redelivery() {
    let queue = InMemoryQueue::new(QueuePolicy::new(Duration::from_millis(30), 5));
    let id = queue.send(FULL_BODY).await;

    let received = queue.receive(&CancellationToken::new()).await.unwrap();
    let consumer = EnvelopeConsumer::new(Arc::new(MemorySink::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = consumer
        .handle(&received.delivery, received.handle.as_ref(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsumerError::Cancelled(_)));
    drop(received);

    let again = tokio::time::timeout(
        Duration::from_secs(1),
        queue.receive(&CancellationToken::new()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(again.delivery.message_id(), &id);
    assert_eq!(again.delivery.delivery_count(), 2);
}

#[tokio::test]
async fn cancellation_on_malformed_body_leaves_it_for_redelivery() {
    let queue = InMemoryQueue::new(QueuePolicy::new(Duration::from_millis(30), 5));
    let id = queue.send("not-json{").await;

    let received = queue.receive(&CancellationToken::new()).await.unwrap();
    let sink = Arc::new(MemorySink::new());
    let consumer = EnvelopeConsumer::new(sink.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = consumer
        .handle(&received.delivery, received.handle.as_ref(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsumerError::Cancelled(_)));
    assert_eq!(sink.count_starting_with("Message "), 0);
    drop(received);

    assert!(queue.dead_letters().await.is_empty());
    let again = tokio::time::timeout(
        Duration::from_secs(1),
        queue.receive(&CancellationToken::new()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(again.delivery.message_id(), &id);
    assert_eq!(again.delivery.delivery_count(), 2);
}

#[tokio::test]
async fn revoked_lock_is_not_reported_as_completed() {
    let queue = InMemoryQueue::new(QueuePolicy::new(Duration::from_millis(30), 1));
    let id = queue.send(FULL_BODY).await;

    let received = queue.receive(&CancellationToken::new()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    // the broker dead-letters on reclaim since the delivery budget is spent
    assert_eq!(queue.counts().await.dead_lettered, 1);

    let sink = Arc::new(MemorySink::new());
    let consumer = EnvelopeConsumer::new(sink.clone());
    let err = consumer
        .handle(
            &received.delivery,
            received.handle.as_ref(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConsumerError::Settlement(SettlementError::LockLost(_))
    ));
    assert_eq!(sink.count_starting_with("Message "), 0);
    let record = queue.status(&id).await.unwrap();
    assert_eq!(record.state, MessageState::DeadLettered);
    assert_eq!(
        record.dead_letter_reason,
        Some(DeadLetterReason::MaxDeliveryCountExceeded)
    );
}

#[tokio::test]
async fn queue_flow_completes_valid_and_dead_letters_malformed() {
    let queue = Arc::new(InMemoryQueue::new(QueuePolicy::default()));
    let sink = Arc::new(MemorySink::new());
    let consumer = Arc::new(EnvelopeConsumer::new(sink.clone()));
    let group = WorkerGroup::spawn(2, queue.clone(), consumer, CancellationToken::new());

    let ok = queue.send(FULL_BODY).await;
    let bad = queue.send("not-json{").await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while !queue.counts().await.is_drained() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue did not drain");
    group.shutdown_and_join().await;

    assert_eq!(queue.status(&ok).await.unwrap().state, MessageState::Completed);
    let dead = queue.dead_letters().await;
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].message_id, bad);
    assert_eq!(dead[0].dead_letter_reason, Some(DeadLetterReason::InvalidFormat));
    assert_eq!(sink.count_starting_with("Processing message: "), 2);
}

#[tokio::test]
async fn repeated_processing_failures_end_in_max_delivery_dead_letter() {
    let queue = Arc::new(InMemoryQueue::new(QueuePolicy::new(
        Duration::from_millis(20),
        3,
    )));
    // the sink refuses every line, so every attempt is abandoned
    let sink = Arc::new(MemorySink::failing_at(0));
    let consumer = Arc::new(EnvelopeConsumer::new(sink));
    let group = WorkerGroup::spawn(1, queue.clone(), consumer, CancellationToken::new());

    let id = queue.send(FULL_BODY).await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while !queue.counts().await.is_drained() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue did not drain");
    group.shutdown_and_join().await;

    let record = queue.status(&id).await.unwrap();
    assert_eq!(record.state, MessageState::DeadLettered);
    assert_eq!(record.delivery_count, 3);
    assert_eq!(
        record.dead_letter_reason,
        Some(DeadLetterReason::MaxDeliveryCountExceeded)
    );
}
