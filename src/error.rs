use thiserror::Error;

use crate::variant::GameVariant;

/// Errors surfaced by content resolution and session construction.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Resolution produced zero rounds; the session refuses to start.
    #[error("no content available for {0}")]
    NoContent(GameVariant),

    /// The embedded fallback content for a variant could not be loaded.
    #[error("built-in content for {variant} is unusable: {reason}")]
    DefaultContent {
        variant: GameVariant,
        reason: String,
    },
}

/// Errors raised by a persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be turned back into a record.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// Collaborator is reachable but refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
