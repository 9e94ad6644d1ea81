//! Error types for the bot engine.

use thiserror::Error;

use crate::page::Key;

/// Why a solver cycle produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The puzzle is not on screen or not ready yet.
    #[error("puzzle not applicable")]
    NotApplicable,

    /// Malformed numeric data (zero denominator, untypable value).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Target number missing from the factor catalog.
    #[error("number {0} is not in the factor catalog")]
    UnknownNumber(u32),

    /// Post-write verification failed.
    #[error("values after input: {observed}, expected {expected}")]
    Mismatch { expected: String, observed: String },
}

impl SolveError {
    /// `NotApplicable` is the normal state between puzzles and is never
    /// reported as a failure.
    pub fn is_expected(&self) -> bool {
        matches!(self, SolveError::NotApplicable)
    }
}

/// An expected keypad control was absent from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("button not found: {key}")]
pub struct ActuatorMiss {
    pub key: Key,
}

/// Outbound notification could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted flag storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persisted flag unavailable: {0}")]
pub struct FlagError(pub String);

/// Reference dataset could not be loaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch factor catalog: {0}")]
    Fetch(String),

    #[error("failed to parse factor catalog: {0}")]
    Parse(String),

    #[error("malformed catalog json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid bot configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for solver operations.
pub type SolveResult<T> = Result<T, SolveError>;
