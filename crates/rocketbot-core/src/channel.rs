//! Control channel: start/stop commands in, log and answer notifications out.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ChannelError;

/// Inbound command from the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    /// Parse a `{"action": ...}` message; unknown actions are rejected.
    pub fn from_json(json: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(json).map_err(|e| ChannelError::Serialization(e.to_string()))
    }
}

/// Synchronous reply to a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn rejected() -> Self {
        Self { success: false }
    }
}

/// Fire-and-forget message to the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    Log { message: String },
    UpdateAnswer { answer: String },
    /// Accelerated-mode answer is typed and waits for an explicit submit.
    PressEnter,
    Error { message: String },
}

impl Notification {
    pub fn to_json(&self) -> Result<String, ChannelError> {
        serde_json::to_string(self).map_err(|e| ChannelError::Serialization(e.to_string()))
    }
}

/// Transport for outbound notifications.
pub trait ControlChannel {
    fn send(&self, notification: &Notification) -> Result<(), ChannelError>;
}

/// Best-effort front for a [`ControlChannel`].
///
/// Delivery failures are traced and dropped; they never abort a cycle.
pub struct Reporter<'a> {
    channel: &'a dyn ControlChannel,
}

impl<'a> Reporter<'a> {
    pub fn new(channel: &'a dyn ControlChannel) -> Self {
        Self { channel }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "rocketbot", "{message}");
        self.send(Notification::Log { message });
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "rocketbot", "{message}");
        self.send(Notification::Error { message });
    }

    pub fn answer(&self, answer: impl Into<String>) {
        self.send(Notification::UpdateAnswer { answer: answer.into() });
    }

    pub fn press_enter(&self) {
        self.send(Notification::PressEnter);
    }

    fn send(&self, notification: Notification) {
        if let Err(e) = self.channel.send(&notification) {
            debug!(error = %e, ?notification, "notification dropped");
        }
    }
}
