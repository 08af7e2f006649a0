//! Predicates — [`Match`] and its conjunction [`MatchSet`]
//!
//! A `Match` tests one aspect of a message, selected by its [`Mode`].
//! A `MatchSet` ANDs several of them.
//!
//! # INV: evaluation never fails
//!
//! `matches()` returns `bool`, never an error. A match whose required
//! parameter is absent, or whose mode is unsupported, evaluates to `false`.
//! [`Match::validate`] is the gate that keeps such rules out of a loaded
//! configuration.

use crate::error::{MatchError, MatchSetError};
use crate::mode::{Mode, Param};
use crate::pattern::{any_key_matches, pattern_matches};
use crate::trace::ConditionTrace;
use crate::Message;
use serde::{Deserialize, Serialize};

/// A single predicate over a message.
///
/// The flat layout mirrors the configuration format: one optional slot per
/// parameter, of which exactly the one required by `mode` should be set.
/// Empty strings and a zero `user_id` count as absent.
///
/// ```yaml
/// mode: message_text
/// regex: true
/// message_text: '^\[(INFO|DEBUG)\]'
/// ```
///
/// # Example
///
/// ```
/// use gatekeep::{Match, Message};
///
/// let m = Match::message_text(r"^\[(INFO|DEBUG)\]").with_regex(true);
/// assert!(m.validate().is_ok());
/// assert!(m.matches(&Message::new().with_text("[INFO] started")));
/// assert!(!m.matches(&Message::new().with_text("[SEVERE] failed")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Match {
    /// Which aspect of the message to test.
    pub mode: Mode,

    /// Interpret string parameters as regular expressions.
    #[serde(default, skip_serializing_if = "is_false")]
    pub regex: bool,

    /// Channel name or pattern, for `channel_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    /// Participant name or pattern, for `user_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Participant id, for `user_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Expected admin flag, for `is_admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Title text or pattern, for `message_title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_title: Option<String>,
    /// Body text or pattern, for `message_text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    /// Extras key or key pattern, for `message_extra`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_extra: Option<String>,
    /// Shared by `message_priority`, `message_priority_gt` and `message_priority_lt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// `Some` only for a non-empty string.
fn non_empty(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().filter(|s| !s.is_empty())
}

impl Match {
    /// A match with the given mode and no parameters.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            regex: false,
            channel_name: None,
            user_name: None,
            user_id: None,
            is_admin: None,
            message_title: None,
            message_text: None,
            message_extra: None,
            priority: None,
        }
    }

    /// Matches every message.
    #[must_use]
    pub fn any() -> Self {
        Self::new(Mode::Any)
    }

    /// Matches messages on a channel whose name matches `pattern`.
    #[must_use]
    pub fn channel_name(pattern: impl Into<String>) -> Self {
        Self {
            channel_name: Some(pattern.into()),
            ..Self::new(Mode::ChannelName)
        }
    }

    /// Matches when the participant's name matches `pattern`.
    #[must_use]
    pub fn user_name(pattern: impl Into<String>) -> Self {
        Self {
            user_name: Some(pattern.into()),
            ..Self::new(Mode::UserName)
        }
    }

    /// Matches when the participant's id equals `id`.
    #[must_use]
    pub fn user_id(id: u64) -> Self {
        Self {
            user_id: Some(id),
            ..Self::new(Mode::UserId)
        }
    }

    /// Matches when the participant's admin flag equals `admin`.
    #[must_use]
    pub fn is_admin(admin: bool) -> Self {
        Self {
            is_admin: Some(admin),
            ..Self::new(Mode::IsAdmin)
        }
    }

    /// Matches messages whose title matches `pattern`.
    #[must_use]
    pub fn message_title(pattern: impl Into<String>) -> Self {
        Self {
            message_title: Some(pattern.into()),
            ..Self::new(Mode::MessageTitle)
        }
    }

    /// Matches messages whose body matches `pattern`.
    #[must_use]
    pub fn message_text(pattern: impl Into<String>) -> Self {
        Self {
            message_text: Some(pattern.into()),
            ..Self::new(Mode::MessageText)
        }
    }

    /// Matches messages carrying an extra whose key matches `pattern`.
    #[must_use]
    pub fn message_extra(pattern: impl Into<String>) -> Self {
        Self {
            message_extra: Some(pattern.into()),
            ..Self::new(Mode::MessageExtra)
        }
    }

    /// Matches messages whose priority equals `value`.
    #[must_use]
    pub fn priority(value: i64) -> Self {
        Self {
            priority: Some(value),
            ..Self::new(Mode::Priority)
        }
    }

    /// Matches messages whose priority is greater than `threshold`.
    #[must_use]
    pub fn priority_gt(threshold: i64) -> Self {
        Self {
            priority: Some(threshold),
            ..Self::new(Mode::PriorityGreaterThan)
        }
    }

    /// Matches messages whose priority is less than `threshold`.
    #[must_use]
    pub fn priority_lt(threshold: i64) -> Self {
        Self {
            priority: Some(threshold),
            ..Self::new(Mode::PriorityLessThan)
        }
    }

    /// Set the regex flag.
    #[must_use]
    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Returns `true` if the slot holds a non-default value.
    #[must_use]
    pub fn has_param(&self, param: Param) -> bool {
        match param {
            Param::ChannelName => non_empty(&self.channel_name).is_some(),
            Param::UserName => non_empty(&self.user_name).is_some(),
            Param::UserId => self.user_id.is_some_and(|id| id != 0),
            Param::IsAdmin => self.is_admin.is_some(),
            Param::MessageTitle => non_empty(&self.message_title).is_some(),
            Param::MessageText => non_empty(&self.message_text).is_some(),
            Param::MessageExtra => non_empty(&self.message_extra).is_some(),
            Param::Priority => self.priority.is_some(),
        }
    }

    /// Slots holding non-default values, in declaration order.
    #[must_use]
    pub fn present_params(&self) -> Vec<Param> {
        Param::ALL
            .into_iter()
            .filter(|param| self.has_param(*param))
            .collect()
    }

    /// Check that this match carries exactly the parameter its mode requires.
    ///
    /// Regex syntax is not checked here: a pattern that fails to compile is
    /// a non-match at evaluation time.
    ///
    /// # Errors
    ///
    /// - [`MatchError::UnsupportedMode`] for an unrecognized mode tag.
    /// - [`MatchError::MissingParameter`] if the required slot is absent or zero-valued.
    /// - [`MatchError::ExtraParameter`] listing every other non-default slot.
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.mode.is_supported() {
            return Err(MatchError::UnsupportedMode {
                value: self.mode.to_string(),
            });
        }

        let required = self.mode.required_param();
        if let Some(field) = required {
            if !self.has_param(field) {
                return Err(MatchError::MissingParameter { field });
            }
        }

        let fields: Vec<Param> = self
            .present_params()
            .into_iter()
            .filter(|param| Some(*param) != required)
            .collect();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(MatchError::ExtraParameter { fields })
        }
    }

    /// Evaluate this match against a message.
    ///
    /// User-based modes compare against [`Message::participant`].
    /// Absent parameters and unsupported modes yield `false`.
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        let who = msg.participant();
        match &self.mode {
            Mode::Any => true,
            Mode::ChannelName => self.text_matches(&self.channel_name, &msg.channel_name),
            Mode::UserName => self.text_matches(&self.user_name, &who.name),
            Mode::UserId => self.user_id.is_some_and(|id| id != 0 && id == who.id),
            Mode::IsAdmin => self.is_admin.is_some_and(|admin| admin == who.admin),
            Mode::MessageTitle => self.text_matches(&self.message_title, &msg.title),
            Mode::MessageText => self.text_matches(&self.message_text, &msg.text),
            Mode::MessageExtra => non_empty(&self.message_extra)
                .is_some_and(|pattern| any_key_matches(self.regex, pattern, msg.extra_keys())),
            Mode::Priority => self.priority.is_some_and(|value| value == msg.priority),
            Mode::PriorityGreaterThan => self.priority.is_some_and(|value| value < msg.priority),
            Mode::PriorityLessThan => self.priority.is_some_and(|value| value > msg.priority),
            Mode::Unsupported(_) => false,
        }
    }

    fn text_matches(&self, slot: &Option<String>, subject: &str) -> bool {
        non_empty(slot).is_some_and(|pattern| pattern_matches(self.regex, pattern, subject))
    }
}

/// Conjunction of [`Match`] predicates.
///
/// Serialized as a plain list. An empty set matches every message; see
/// [`RuleChain::validate_strict`](crate::RuleChain::validate_strict) for
/// configurations that must not contain one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet {
    matches: Vec<Match>,
}

impl MatchSet {
    /// Create a set from a list of matches.
    #[must_use]
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    /// Iterate over the contained matches in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    /// Returns the number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` if the set holds no matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Validate every entry, continuing past failures.
    ///
    /// # Errors
    ///
    /// Returns [`MatchSetError`] listing the index and error of every
    /// invalid entry.
    pub fn validate(&self) -> Result<(), MatchSetError> {
        let errors: Vec<_> = self
            .matches
            .iter()
            .enumerate()
            .filter_map(|(index, m)| m.validate().err().map(|e| (index, e)))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MatchSetError { errors })
        }
    }

    /// Returns `true` if every match matches. Short-circuits on the first `false`.
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        self.matches.iter().all(|m| m.matches(msg))
    }

    /// Evaluate every match (no short-circuit) and record each result.
    #[must_use]
    pub fn evaluate_with_trace(&self, msg: &Message) -> Vec<ConditionTrace> {
        self.matches
            .iter()
            .enumerate()
            .map(|(index, m)| ConditionTrace {
                index,
                mode: m.mode.clone(),
                matched: m.matches(msg),
            })
            .collect()
    }
}

impl From<Vec<Match>> for MatchSet {
    fn from(matches: Vec<Match>) -> Self {
        Self::new(matches)
    }
}

impl FromIterator<Match> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Match>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
