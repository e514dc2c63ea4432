//! AppBuilder - Consumer ホストの組み立て
//!
//! # Fail-fast 設計
//! - MessageSource が未設定なら build() で BuildError
//! - worker 数 0 も build() で弾く（何も処理されないまま起動してしまうため）

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::consumer::EnvelopeConsumer;
use super::worker_loop::WorkerGroup;
use crate::config::Config;
use crate::impls::TracingSink;
use crate::ports::{LogSink, MessageSource};

/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(Config::from_env()?)
///     .source(queue.clone())
///     .build()?;
/// let workers = app.start(CancellationToken::new());
/// ```
pub struct AppBuilder {
    config: Config,
    source: Option<Arc<dyn MessageSource>>,
    sink: Option<Arc<dyn LogSink>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no message source configured for queue {0:?}")]
    MissingSource(String),

    #[error("max_concurrent_calls must be at least 1")]
    NoWorkers,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: None,
            sink: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn MessageSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Defaults to [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let source = self
            .source
            .ok_or_else(|| BuildError::MissingSource(self.config.queue_name.clone()))?;
        if self.config.max_concurrent_calls == 0 {
            return Err(BuildError::NoWorkers);
        }
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));

        Ok(App {
            config: self.config,
            source,
            consumer: Arc::new(EnvelopeConsumer::new(sink)),
        })
    }
}

/// A wired consumer host, ready to start.
pub struct App {
    config: Config,
    source: Arc<dyn MessageSource>,
    consumer: Arc<EnvelopeConsumer>,
}

impl App {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn consumer(&self) -> Arc<EnvelopeConsumer> {
        Arc::clone(&self.consumer)
    }

    /// Spawn `max_concurrent_calls` workers against the source.
    pub fn start(&self, cancel: CancellationToken) -> WorkerGroup {
        info!(
            queue = %self.config.queue_name,
            connection = %self.config.connection_setting,
            workers = self.config.max_concurrent_calls,
            "starting envelope consumer"
        );
        WorkerGroup::spawn(
            self.config.max_concurrent_calls,
            Arc::clone(&self.source),
            Arc::clone(&self.consumer),
            cancel,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{InMemoryQueue, QueuePolicy};

    #[test]
    fn build_without_source_fails() {
        let result = AppBuilder::new(Config::default()).build();
        assert!(matches!(
            result,
            Err(BuildError::MissingSource(queue)) if queue == "email-queue"
        ));
    }

    #[test]
    fn build_with_zero_workers_fails() {
        let config = Config {
            max_concurrent_calls: 0,
            ..Config::default()
        };
        let result = AppBuilder::new(config)
            .source(Arc::new(InMemoryQueue::new(QueuePolicy::default())))
            .build();
        assert!(matches!(result, Err(BuildError::NoWorkers)));
    }

    #[tokio::test]
    async fn start_spawns_configured_workers() {
        let config = Config {
            max_concurrent_calls: 4,
            ..Config::default()
        };
        let app = AppBuilder::new(config)
            .source(Arc::new(InMemoryQueue::new(QueuePolicy::default())))
            .build()
            .unwrap();

        let workers = app.start(CancellationToken::new());
        assert_eq!(workers.len(), 4);
        workers.shutdown_and_join().await;
    }
}
