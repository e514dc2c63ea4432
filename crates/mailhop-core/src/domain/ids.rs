//! Identifiers handed out by the queue.
//!
//! Consumer から見るとどちらも opaque。中身を解釈してはいけない。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Queue-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Ulid> for MessageId {
    fn from(ulid: Ulid) -> Self {
        Self(format!("msg-{ulid}"))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof of a peek-lock. A settlement is only honoured while the token that
/// issued it still holds the lock.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(Ulid);

impl LockToken {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock-{}", self.0)
    }
}
