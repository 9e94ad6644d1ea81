//! Reload-resilient on/off flag.

use async_trait::async_trait;

use crate::error::FlagError;

/// Storage key shared with the popup.
pub const RUNNING_FLAG_KEY: &str = "isRunning";

/// A single boolean that survives page reloads.
#[async_trait(?Send)]
pub trait PersistedFlag {
    /// Stored value; an unset flag reads as `false`.
    async fn load(&self) -> Result<bool, FlagError>;

    async fn store(&self, running: bool) -> Result<(), FlagError>;
}
