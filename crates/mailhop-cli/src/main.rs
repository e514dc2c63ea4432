//! mailhop - run the envelope consumer against an in-memory queue.
//!
//! Publishes the given bodies (or a sample set), lets the worker group settle
//! them, then prints the queue counts and the dead-letter sub-queue.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mailhop_core::observability::init_tracing;
use mailhop_core::queue::InMemoryQueue;
use mailhop_core::{AppBuilder, Config, MailEnvelope, encode_envelope};

#[derive(Debug, Parser)]
#[command(name = "mailhop", version, about)]
struct Cli {
    /// App setting naming the queue connection. Passed through, never parsed.
    #[arg(long, env = "MAILHOP_CONNECTION_SETTING")]
    connection_setting: Option<String>,

    /// Queue to consume from.
    #[arg(long, env = "MAILHOP_QUEUE_NAME")]
    queue_name: Option<String>,

    /// Parallel consumer invocations.
    #[arg(long, env = "MAILHOP_MAX_CONCURRENT_CALLS")]
    workers: Option<usize>,

    /// Peek-lock duration in seconds.
    #[arg(long, env = "MAILHOP_LOCK_DURATION_SECS")]
    lock_duration_secs: Option<u64>,

    /// Deliveries before the queue dead-letters.
    #[arg(long, env = "MAILHOP_MAX_DELIVERY_COUNT")]
    max_delivery_count: Option<u32>,

    /// Give up waiting for settlement after this many seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Raw message bodies to publish. A sample set is used when none are given.
    bodies: Vec<String>,
}

impl Cli {
    /// Flags (or their env vars) win over `Config` defaults.
    fn apply(&self, config: &mut Config) {
        if let Some(name) = &self.connection_setting {
            config.connection_setting = name.clone();
        }
        if let Some(name) = &self.queue_name {
            config.queue_name = name.clone();
        }
        if let Some(workers) = self.workers {
            config.max_concurrent_calls = workers;
        }
        if let Some(secs) = self.lock_duration_secs {
            config.lock_duration_secs = secs;
        }
        if let Some(count) = self.max_delivery_count {
            config.max_delivery_count = count;
        }
    }
}

fn sample_bodies() -> Vec<Vec<u8>> {
    let full = MailEnvelope::new()
        .with_subject("Hi")
        .with_sender("a@b.com")
        .with_received_at("2026-02-02T10:00:00Z")
        .with_body_preview("Hello world");
    vec![
        encode_envelope(&full),
        encode_envelope(&MailEnvelope::new()),
        encode_envelope(&MailEnvelope::new().with_subject("Test")),
        b"not-json{".to_vec(),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("reading MAILHOP_* environment")?;
    cli.apply(&mut config);
    info!(config = %serde_json::to_string(&config)?, "effective configuration");

    let queue = Arc::new(InMemoryQueue::new(config.queue_policy()));
    let app = AppBuilder::new(config).source(queue.clone()).build()?;

    let cancel = CancellationToken::new();
    let workers = app.start(cancel.clone());

    let bodies = if cli.bodies.is_empty() {
        sample_bodies()
    } else {
        cli.bodies.into_iter().map(String::into_bytes).collect()
    };
    for body in bodies {
        let message_id = queue.send(body).await;
        info!(message_id = %message_id, "published");
    }

    // 全件 settle されるまでポーリング（Ctrl-C で中断）
    let deadline = Instant::now() + Duration::from_secs(cli.timeout_secs);
    let drained = loop {
        if queue.counts().await.is_drained() {
            break true;
        }
        if Instant::now() >= deadline {
            break false;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted");
                break false;
            }
            _ = sleep(Duration::from_millis(50)) => {}
        }
    };

    workers.shutdown_and_join().await;

    let counts = queue.counts().await;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    for record in queue.dead_letters().await {
        println!("dead-letter: {}", serde_json::to_string(&record)?);
    }

    if !drained {
        bail!("{} message(s) left unsettled", counts.active + counts.locked);
    }
    Ok(())
}
