//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **TracingSink**: 本番用。tracing subscriber にそのまま流す
//! - **MemorySink**: テスト・開発用。行を溜めて後から数えられる
//!
//! キューの実装（InMemoryQueue）は `queue` モジュールにある。

pub mod memory_sink;
pub mod tracing_sink;

pub use self::memory_sink::{MemorySink, RecordedLine};
pub use self::tracing_sink::TracingSink;
