//! Domain model (envelope, ids, deliveries, settlements, errors).

pub mod delivery;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod settlement;

pub use delivery::Delivery;
pub use envelope::{EnvelopeField, MailEnvelope, PREVIEW_MAX_CHARS};
pub use errors::{ConsumerError, DecodeError, SettlementError, SinkError};
pub use ids::{LockToken, MessageId};
pub use settlement::{DeadLetterReason, Settlement};
