//! Envelope codec - raw body と MailEnvelope の相互変換
//!
//! # デコードの流れ
//! 1. bytes を serde_json::Value として parse（失敗 → `DecodeError::Syntax`）
//! 2. object であることを確認（それ以外 → `DecodeError::NotAnObject`）
//! 3. MailEnvelope に変換（型違い → `DecodeError::Field`）
//!
//! 未知のキーは無視し、`null` は欠損扱いにする。副作用なし。

use serde_json::Value;

use crate::domain::{DecodeError, MailEnvelope};

/// Decode a queue body into an envelope.
pub fn decode_envelope(body: &[u8]) -> Result<MailEnvelope, DecodeError> {
    let value: Value = serde_json::from_slice(body).map_err(DecodeError::Syntax)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject {
            found: json_kind(&value),
        });
    }
    serde_json::from_value(value).map_err(DecodeError::Field)
}

/// Producer-side encoding. Absent fields are omitted from the document.
pub fn encode_envelope(envelope: &MailEnvelope) -> Vec<u8> {
    // a struct of optional strings always serializes
    serde_json::to_vec(envelope).unwrap_or_else(|_| b"{}".to_vec())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
