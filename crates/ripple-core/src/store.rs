//! Persistence seam for chat messages.
//!
//! The relay only ever appends: `persist(record)` either succeeds or fails,
//! and a failure never retracts realtime delivery that already happened.
//! Schema, indexing, and history retrieval belong to the store behind the
//! trait, not to the relay.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Persistence record for a chat message.
///
/// Keyed on `is_group`: direct messages carry `receiver`, group messages
/// carry `group`. Opaque to the relay beyond this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    /// Sender user id.
    pub sender: String,
    /// Receiver user id, for direct messages.
    pub receiver: Option<String>,
    /// Group id, for group messages.
    pub group: Option<String>,
    /// Message body.
    pub message: Option<String>,
    /// Message kind (`"text"`, media kinds, ...).
    pub kind: String,
    /// Whether this is a group message.
    pub is_group: bool,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or errored on the write.
    #[error("Write failed: {0}")]
    Write(String),
}

/// Append-only message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a chat message.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected or the store is unreachable.
    async fn persist(&self, record: &ChatRecord) -> Result<(), StoreError>;
}

/// Store used when persistence is not configured: accepts and discards.
#[derive(Debug, Default)]
pub struct NullMessageStore;

#[async_trait]
impl MessageStore for NullMessageStore {
    async fn persist(&self, record: &ChatRecord) -> Result<(), StoreError> {
        debug!(sender = %record.sender, "Persistence disabled, dropping record");
        Ok(())
    }
}
