//! `Mode` — which aspect of a message a [`Match`](crate::Match) inspects
//!
//! Every mode requires exactly one parameter (except [`Mode::Any`], which
//! takes none). The table lives in [`Mode::required_param`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate kind of a [`Match`](crate::Match).
///
/// Serialized as the snake-case tag used in configuration files
/// (`any`, `user_name`, `message_priority_gt`, ...). A tag this engine does
/// not know deserializes into [`Mode::Unsupported`] so that validation can
/// report it by value; such a match never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Matches every message.
    Any,
    /// Channel the message is broadcast through.
    ChannelName,
    /// Name of the resolved participant.
    UserName,
    /// Id of the resolved participant.
    UserId,
    /// Admin flag of the resolved participant.
    IsAdmin,
    /// Message title.
    MessageTitle,
    /// Message body.
    MessageText,
    /// Presence of an extra whose key matches.
    MessageExtra,
    /// Message priority equals the value.
    Priority,
    /// Message priority is greater than the value.
    PriorityGreaterThan,
    /// Message priority is less than the value.
    PriorityLessThan,
    /// A tag not recognized by this engine.
    Unsupported(String),
}

impl Mode {
    /// All recognized modes.
    pub const ALL: [Mode; 11] = [
        Mode::Any,
        Mode::ChannelName,
        Mode::UserName,
        Mode::UserId,
        Mode::IsAdmin,
        Mode::MessageTitle,
        Mode::MessageText,
        Mode::MessageExtra,
        Mode::Priority,
        Mode::PriorityGreaterThan,
        Mode::PriorityLessThan,
    ];

    /// Configuration tag of this mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "any",
            Self::ChannelName => "channel_name",
            Self::UserName => "user_name",
            Self::UserId => "user_id",
            Self::IsAdmin => "is_admin",
            Self::MessageTitle => "message_title",
            Self::MessageText => "message_text",
            Self::MessageExtra => "message_extra",
            Self::Priority => "message_priority",
            Self::PriorityGreaterThan => "message_priority_gt",
            Self::PriorityLessThan => "message_priority_lt",
            Self::Unsupported(tag) => tag,
        }
    }

    /// The parameter this mode requires, `None` for [`Mode::Any`] and
    /// [`Mode::Unsupported`].
    #[must_use]
    pub fn required_param(&self) -> Option<Param> {
        match self {
            Self::Any | Self::Unsupported(_) => None,
            Self::ChannelName => Some(Param::ChannelName),
            Self::UserName => Some(Param::UserName),
            Self::UserId => Some(Param::UserId),
            Self::IsAdmin => Some(Param::IsAdmin),
            Self::MessageTitle => Some(Param::MessageTitle),
            Self::MessageText => Some(Param::MessageText),
            Self::MessageExtra => Some(Param::MessageExtra),
            Self::Priority | Self::PriorityGreaterThan | Self::PriorityLessThan => {
                Some(Param::Priority)
            }
        }
    }

    /// Returns `true` unless this is [`Mode::Unsupported`].
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<&str> for Mode {
    fn from(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == tag)
            .unwrap_or_else(|| Self::Unsupported(tag.to_owned()))
    }
}

impl From<String> for Mode {
    fn from(tag: String) -> Self {
        match Self::from(tag.as_str()) {
            Self::Unsupported(_) => Self::Unsupported(tag),
            mode => mode,
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Unsupported(tag) => tag,
            mode => mode.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter slot of a [`Match`](crate::Match).
///
/// Displays as the configuration key of the slot, which is what validation
/// errors report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    ChannelName,
    UserName,
    UserId,
    IsAdmin,
    MessageTitle,
    MessageText,
    MessageExtra,
    /// Shared by the three priority modes.
    Priority,
}

impl Param {
    /// All parameter slots, in declaration order.
    pub const ALL: [Param; 8] = [
        Param::ChannelName,
        Param::UserName,
        Param::UserId,
        Param::IsAdmin,
        Param::MessageTitle,
        Param::MessageText,
        Param::MessageExtra,
        Param::Priority,
    ];

    /// Configuration key of this slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ChannelName => "channel_name",
            Self::UserName => "user_name",
            Self::UserId => "user_id",
            Self::IsAdmin => "is_admin",
            Self::MessageTitle => "message_title",
            Self::MessageText => "message_text",
            Self::MessageExtra => "message_extra",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
