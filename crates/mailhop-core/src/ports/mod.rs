//! Ports - 外部システムとの境界
//!
//! キュー（受信・settle）、観測ログの出口、時刻、ID 生成を trait として切り出す。
//! 実装は `queue`（InMemoryQueue）と `impls`（TracingSink, MemorySink）にある。

pub mod clock;
pub mod id_generator;
pub mod log_sink;
pub mod message_source;
pub mod settlement;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::log_sink::{LogLevel, LogLine, LogSink};
pub use self::message_source::{MessageSource, ReceivedMessage};
pub use self::settlement::SettlementHandle;
