//! mailhop-core
//!
//! Ingestion and settlement of mail envelopes delivered through a queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（MailEnvelope, Delivery, Settlement, ids, errors）
//! - **codec**: body ⇔ MailEnvelope の変換（decode は純粋関数）
//! - **ports**: 抽象化レイヤー（SettlementHandle, MessageSource, LogSink, Clock, IdGenerator）
//! - **app**: EnvelopeConsumer（状態遷移と settle）、WorkerGroup、AppBuilder
//! - **queue**: InMemoryQueue（peek-lock, lock expiry, dead-letter を持つ開発・テスト用キュー）
//! - **impls**: LogSink の実装（TracingSink, MemorySink）
//! - **config** / **observability**: 環境変数からの設定、tracing の初期化

pub mod app;
pub mod codec;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{App, AppBuilder, EnvelopeConsumer, WorkerGroup};
pub use codec::{decode_envelope, encode_envelope};
pub use config::Config;
pub use domain::{
    ConsumerError, DeadLetterReason, DecodeError, Delivery, MailEnvelope, MessageId, Settlement,
};
