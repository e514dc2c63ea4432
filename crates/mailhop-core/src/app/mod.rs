//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **EnvelopeConsumer**: 1 メッセージ分の decode → ログ → settle
//! - **WorkerGroup**: MessageSource から受け取って Consumer を呼ぶループ群
//! - **AppBuilder**: config・source・sink のワイヤリング

pub mod builder;
pub mod consumer;
pub mod worker_loop;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::consumer::EnvelopeConsumer;
pub use self::worker_loop::WorkerGroup;
