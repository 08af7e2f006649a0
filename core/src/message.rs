//! `Message` — the record a rule chain decides on
//!
//! A message carries both participants of one delivery. Which of the two a
//! participant-based rule inspects depends on the direction of the message,
//! see [`Message::participant`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of one side of a delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    /// Numeric user id.
    pub id: u64,
    /// Login name.
    pub name: String,
    /// Whether the user is an administrator.
    pub admin: bool,
}

impl UserContext {
    /// Create a user context.
    pub fn new(id: u64, name: impl Into<String>, admin: bool) -> Self {
        Self {
            id,
            name: name.into(),
            admin,
        }
    }
}

/// A message travelling through a broadcast channel.
///
/// Every field defaults, so partial YAML/JSON documents deserialize; an
/// absent `extras` map is simply empty.
///
/// # Example
///
/// ```
/// use gatekeep::{Message, UserContext};
///
/// let msg = Message::new()
///     .with_sender(UserContext::new(1, "alice", false))
///     .with_receiver(UserContext::new(2, "bob", true))
///     .with_text("[INFO] started")
///     .with_priority(5);
///
/// // Inbound: rules look at the sender.
/// assert_eq!(msg.participant().name, "alice");
/// // Outbound: rules look at the receiver.
/// assert_eq!(msg.with_outbound(true).participant().name, "bob");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Who sent the message.
    pub sender: UserContext,
    /// Who the message is delivered to.
    pub receiver: UserContext,
    /// Message title.
    pub title: String,
    /// Message body.
    pub text: String,
    /// Named auxiliary values. Rules only look at the key names.
    pub extras: HashMap<String, serde_json::Value>,
    /// Message priority.
    pub priority: i64,
    /// Name of the channel the message is broadcast through.
    pub channel_name: String,
    /// `true` while the owning user is sending towards others,
    /// `false` while the message is delivered to the owning user.
    pub outbound: bool,
}

impl Message {
    /// Create an empty inbound message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: UserContext) -> Self {
        self.sender = sender;
        self
    }

    /// Set the receiver.
    #[must_use]
    pub fn with_receiver(mut self, receiver: UserContext) -> Self {
        self.receiver = receiver;
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the body text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attach an extra under `key`.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the channel name.
    #[must_use]
    pub fn with_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = channel_name.into();
        self
    }

    /// Set the direction (`true` = outbound).
    #[must_use]
    pub fn with_outbound(mut self, outbound: bool) -> Self {
        self.outbound = outbound;
        self
    }

    /// The participant that user-based rules compare against.
    ///
    /// Outbound messages resolve to the receiver (the sender filters who it
    /// broadcasts to), inbound messages resolve to the sender (the recipient
    /// filters who it hears from).
    #[must_use]
    pub fn participant(&self) -> &UserContext {
        if self.outbound {
            &self.receiver
        } else {
            &self.sender
        }
    }

    /// Names of the attached extras, in no particular order.
    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.extras.keys().map(String::as_str)
    }
}
