//! MemorySink - 出したログ行を覚えておく sink（テスト・開発用）
//!
//! `failing_at(n)` で n 行目（0 始まり）の emit を失敗させられる。
//! decode 後の失敗で abandon されることを確かめるのに使う。

use std::sync::Mutex;

use crate::domain::{MessageId, SinkError};
use crate::ports::{LogLevel, LogLine, LogSink};

/// A rendered line as the sink received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLine {
    pub level: LogLevel,
    pub message_id: MessageId,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<RecordedLine>>,
    fail_at: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `index`-th emit (and every later one).
    pub fn failing_at(index: usize) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            fail_at: Some(index),
        }
    }

    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.text).collect()
    }

    /// Lines whose text starts with `prefix`.
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.text.starts_with(prefix))
            .count()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, line: &LogLine<'_>) -> Result<(), SinkError> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| SinkError::new("memory sink poisoned"))?;

        if self.fail_at.is_some_and(|index| lines.len() >= index) {
            return Err(SinkError::new(format!("refusing line: {line}")));
        }

        lines.push(RecordedLine {
            level: line.level(),
            message_id: line.message_id().clone(),
            text: line.to_string(),
        });
        Ok(())
    }
}
