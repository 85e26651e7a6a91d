//! Relay configuration store.
//!
//! Holds the single [`RelayTarget`]. The store is read fresh on every relay so
//! an admin change applies to the very next message. Writes replace the whole
//! record, so a concurrent reader sees the old or the new target, never a mix.

use async_trait::async_trait;

use crate::types::RelayTarget;

mod error;
mod file;

pub use error::{StorageError, StorageResult};
pub use file::FileRelayStore;

/// Persistence for the relay target.
#[async_trait]
pub trait RelayStore: Send + Sync {
    /// Current target. A missing or unreadable store is `Unconfigured`.
    async fn load(&self) -> RelayTarget;

    /// Overwrite the stored target. Last writer wins.
    async fn save(&self, target: &RelayTarget) -> StorageResult<()>;
}
