//! `Rule` — conditions + action
//!
//! A rule binds a [`MatchSet`] to the [`Action`] taken when it matches.
//! A [`RuleChain`](crate::RuleChain) holds rules in evaluation order.

use crate::error::RuleFault;
use crate::{MatchSet, Message};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to a message.
///
/// Serialized as `accept` / `reject`. Any other string deserializes into
/// [`Action::Unrecognized`], which validation reports as an invalid action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// Let the message through.
    Accept,
    /// Drop the message.
    Reject,
    /// An action string that is neither `accept` nor `reject`.
    Unrecognized(String),
}

impl Action {
    /// Configuration string of this action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Unrecognized(value) => value,
        }
    }

    /// Returns `true` for [`Action::Accept`] and [`Action::Reject`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match value.as_str() {
            "accept" => Self::Accept,
            "reject" => Self::Reject,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Unrecognized(value) => value,
            action => action.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule: conditions + action.
///
/// Serialized as `{ match: [...], action: accept|reject }`. Both keys are
/// required; an unconditional rule is written `match: []`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Conditions that must all match.
    #[serde(rename = "match")]
    pub conditions: MatchSet,

    /// Action taken when the conditions match.
    pub action: Action,
}

impl Rule {
    /// Create a rule.
    pub fn new(conditions: impl Into<MatchSet>, action: Action) -> Self {
        Self {
            conditions: conditions.into(),
            action,
        }
    }

    /// Returns `true` if every condition matches the message.
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        self.conditions.matches(msg)
    }

    /// Collect everything wrong with this rule.
    ///
    /// An invalid action and invalid conditions are both reported.
    #[must_use]
    pub fn faults(&self) -> Vec<RuleFault> {
        let mut faults = Vec::new();
        if !self.action.is_valid() {
            faults.push(RuleFault::InvalidAction {
                value: self.action.to_string(),
            });
        }
        if let Err(e) = self.conditions.validate() {
            faults.push(RuleFault::Conditions(e));
        }
        faults
    }
}
