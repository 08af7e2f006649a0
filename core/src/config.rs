//! Filter configuration document.
//!
//! A [`FilterConfig`] is what a user edits: the channels they publish on and
//! two rule chains deciding which broadcasts they receive (`sender_filter`)
//! and which of their own broadcasts go out to a given receiver
//! (`receiver_filter`).
//!
//! ```yaml
//! channels:
//!   - name: example
//!     public: false
//! sender_filter:
//!   - match:
//!       - mode: any
//!     action: accept
//! receiver_filter: []
//! ```
//!
//! # Which chain applies
//!
//! | Message direction | Chain | Rules test |
//! |-------------------|-------|------------|
//! | inbound (`outbound == false`) | `sender_filter` | the sender |
//! | outbound (`outbound == true`) | `receiver_filter` | the receiver |
//!
//! Both chains default to [`Action::Accept`] when no rule matches.

use crate::error::RuleChainError;
use crate::{Action, Filter, Match, Message, Rule, RuleChain};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Action returned when no rule of a chain matches.
pub const DEFAULT_ACTION: Action = Action::Accept;

/// A broadcast channel owned by the configuring user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDef {
    /// Channel name, unique per configuration.
    pub name: String,
    /// Whether other users may see the channel.
    #[serde(default)]
    pub public: bool,
}

impl ChannelDef {
    /// Create a channel definition.
    #[must_use]
    pub fn new(name: impl Into<String>, public: bool) -> Self {
        Self {
            name: name.into(),
            public,
        }
    }
}

/// Per-user filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Channels this user broadcasts on.
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
    /// Applied to inbound broadcasts; rules test the sender.
    #[serde(default)]
    pub sender_filter: RuleChain,
    /// Applied to outbound broadcasts; rules test the receiver.
    #[serde(default)]
    pub receiver_filter: RuleChain,
}

/// Errors from loading or validating a [`FilterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid YAML for this schema.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The document is not valid JSON for this schema.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The sender filter failed validation.
    #[error("sender_filter: {0}")]
    SenderFilter(#[source] RuleChainError),
    /// The receiver filter failed validation.
    #[error("receiver_filter: {0}")]
    ReceiverFilter(#[source] RuleChainError),
    /// Two channels share a name.
    #[error("channel name {name} is duplicated")]
    DuplicateChannel { name: String },
}

impl Default for FilterConfig {
    /// The starter document handed to new users: one private example
    /// channel, a sender filter that hides `[INFO]`/`[DEBUG]` chatter from a
    /// server account, and accept-all tails on both chains.
    fn default() -> Self {
        Self {
            channels: vec![ChannelDef::new("example", false)],
            sender_filter: RuleChain::new(vec![
                Rule::new(
                    vec![
                        Match::user_name("my_server"),
                        Match::message_text(r"^\[(INFO|DEBUG)\]").with_regex(true),
                    ],
                    Action::Reject,
                ),
                Rule::new(
                    vec![Match::user_name("some_one_i_dont_want_to_see_broadcast_from")],
                    Action::Reject,
                ),
                Rule::new(vec![Match::any()], Action::Accept),
            ]),
            receiver_filter: RuleChain::new(vec![
                Rule::new(
                    vec![Match::user_name("some_one_i_dont_want_to_send_broadcast_to")],
                    Action::Reject,
                ),
                Rule::new(vec![Match::any()], Action::Accept),
            ]),
        }
    }
}

impl FilterConfig {
    /// Parse a YAML document. Does not validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed input or unknown keys.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON document. Does not validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input or unknown keys.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)?
        } else {
            Self::from_yaml(&text)?
        };
        config.validate()?;
        debug!(
            path = %path.display(),
            channels = config.channels.len(),
            sender_rules = config.sender_filter.len(),
            receiver_rules = config.receiver_filter.len(),
            "loaded filter config"
        );
        Ok(config)
    }

    /// Check both chains and channel-name uniqueness.
    ///
    /// The sender filter is checked first; the first failing part is
    /// reported.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SenderFilter`] / [`ConfigError::ReceiverFilter`] with
    ///   every faulty rule index of that chain.
    /// - [`ConfigError::DuplicateChannel`] for the first repeated name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.check();
        if let Err(e) = &result {
            warn!(error = %e, "rejected filter config");
        }
        result
    }

    fn check(&self) -> Result<(), ConfigError> {
        self.sender_filter
            .validate()
            .map_err(ConfigError::SenderFilter)?;
        self.receiver_filter
            .validate()
            .map_err(ConfigError::ReceiverFilter)?;

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(ConfigError::DuplicateChannel {
                    name: channel.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The chain that decides `msg`: receiver filter when outbound, sender
    /// filter otherwise.
    #[must_use]
    pub fn chain_for(&self, msg: &Message) -> &RuleChain {
        if msg.outbound {
            &self.receiver_filter
        } else {
            &self.sender_filter
        }
    }

    /// Validate and compile both chains for repeated evaluation.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`validate`](Self::validate).
    pub fn compile(&self) -> Result<CompiledConfig, ConfigError> {
        self.validate()?;
        let sender = Filter::compile(&self.sender_filter).map_err(ConfigError::SenderFilter)?;
        let receiver =
            Filter::compile(&self.receiver_filter).map_err(ConfigError::ReceiverFilter)?;
        Ok(CompiledConfig {
            channels: self.channels.clone(),
            sender,
            receiver,
        })
    }

    /// Render as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Public channels, in declaration order.
    pub fn public_channels(&self) -> impl Iterator<Item = &ChannelDef> {
        self.channels.iter().filter(|c| c.public)
    }
}

/// A validated [`FilterConfig`] with both chains compiled.
///
/// Built once per load by [`FilterConfig::compile`] and shared read-only by
/// every delivery; patterns are not recompiled per message.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    channels: Vec<ChannelDef>,
    sender: Filter,
    receiver: Filter,
}

impl CompiledConfig {
    /// The channels of the source configuration.
    #[must_use]
    pub fn channels(&self) -> &[ChannelDef] {
        &self.channels
    }

    /// The compiled filter that decides `msg`, picked like
    /// [`FilterConfig::chain_for`].
    #[must_use]
    pub fn filter_for(&self, msg: &Message) -> &Filter {
        if msg.outbound {
            &self.receiver
        } else {
            &self.sender
        }
    }

    /// Decide on `msg` with the filter for its direction.
    #[must_use]
    pub fn decide(&self, msg: &Message) -> Action {
        self.filter_for(msg).evaluate(msg, DEFAULT_ACTION)
    }

    /// Should this user receive an inbound broadcast?
    #[must_use]
    pub fn admit_inbound(&self, msg: &Message) -> bool {
        self.sender.evaluate(msg, DEFAULT_ACTION) == Action::Accept
    }

    /// Should this user's broadcast be delivered to the message's receiver?
    #[must_use]
    pub fn admit_outbound(&self, msg: &Message) -> bool {
        self.receiver.evaluate(msg, DEFAULT_ACTION) == Action::Accept
    }
}
