//! Compiled filter — validated rules with precompiled patterns
//!
//! [`RuleChain`] is the configuration form: flat, serializable, possibly
//! malformed. [`Filter`] is the runtime form, built once per load:
//!
//! ```text
//! RuleChain --validate--> Filter { rules: [CompiledRule { conditions: [Condition], action }] }
//! ```
//!
//! A [`Condition`] carries exactly the parameter its mode needs, so the
//! "missing parameter" state cannot be represented after compilation, and
//! each regex is compiled once instead of on every message.

use crate::error::{MatchError, RuleChainError, RuleFault};
use crate::mode::Param;
use crate::pattern::Pattern;
use crate::{Action, Match, MatchSetError, Message, Mode, RuleChain};
use std::fmt;
use tracing::{debug, trace};

/// One compiled predicate.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Always true.
    Any,
    /// Channel name matches.
    ChannelName(Pattern),
    /// Participant name matches.
    UserName(Pattern),
    /// Participant id equals.
    UserId(u64),
    /// Participant admin flag equals.
    IsAdmin(bool),
    /// Title matches.
    MessageTitle(Pattern),
    /// Body text matches.
    MessageText(Pattern),
    /// Some extras key matches.
    MessageExtra(Pattern),
    /// Priority equals.
    Priority(i64),
    /// Priority is strictly greater than the threshold.
    PriorityGreaterThan(i64),
    /// Priority is strictly less than the threshold.
    PriorityLessThan(i64),
}

impl Condition {
    /// Compile a validated [`Match`].
    ///
    /// # Errors
    ///
    /// Returns the same [`MatchError`] as [`Match::validate`].
    pub fn compile(m: &Match) -> Result<Self, MatchError> {
        m.validate()?;

        let pattern = |slot: &Option<String>, field| {
            require(slot.as_deref(), field).map(|p| Pattern::new(m.regex, p))
        };
        Ok(match &m.mode {
            Mode::Any => Self::Any,
            Mode::ChannelName => Self::ChannelName(pattern(&m.channel_name, Param::ChannelName)?),
            Mode::UserName => Self::UserName(pattern(&m.user_name, Param::UserName)?),
            Mode::UserId => Self::UserId(require(m.user_id, Param::UserId)?),
            Mode::IsAdmin => Self::IsAdmin(require(m.is_admin, Param::IsAdmin)?),
            Mode::MessageTitle => Self::MessageTitle(pattern(&m.message_title, Param::MessageTitle)?),
            Mode::MessageText => Self::MessageText(pattern(&m.message_text, Param::MessageText)?),
            Mode::MessageExtra => Self::MessageExtra(pattern(&m.message_extra, Param::MessageExtra)?),
            Mode::Priority => Self::Priority(require(m.priority, Param::Priority)?),
            Mode::PriorityGreaterThan => {
                Self::PriorityGreaterThan(require(m.priority, Param::Priority)?)
            }
            Mode::PriorityLessThan => Self::PriorityLessThan(require(m.priority, Param::Priority)?),
            Mode::Unsupported(value) => {
                return Err(MatchError::UnsupportedMode {
                    value: value.clone(),
                })
            }
        })
    }

    /// The mode this condition was compiled from.
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Any => Mode::Any,
            Self::ChannelName(_) => Mode::ChannelName,
            Self::UserName(_) => Mode::UserName,
            Self::UserId(_) => Mode::UserId,
            Self::IsAdmin(_) => Mode::IsAdmin,
            Self::MessageTitle(_) => Mode::MessageTitle,
            Self::MessageText(_) => Mode::MessageText,
            Self::MessageExtra(_) => Mode::MessageExtra,
            Self::Priority(_) => Mode::Priority,
            Self::PriorityGreaterThan(_) => Mode::PriorityGreaterThan,
            Self::PriorityLessThan(_) => Mode::PriorityLessThan,
        }
    }

    /// Evaluate against a message. Same results as [`Match::matches`].
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        let who = msg.participant();
        match self {
            Self::Any => true,
            Self::ChannelName(p) => p.is_match(&msg.channel_name),
            Self::UserName(p) => p.is_match(&who.name),
            Self::UserId(id) => *id == who.id,
            Self::IsAdmin(admin) => *admin == who.admin,
            Self::MessageTitle(p) => p.is_match(&msg.title),
            Self::MessageText(p) => p.is_match(&msg.text),
            Self::MessageExtra(p) => p.matches_any(msg.extra_keys()),
            Self::Priority(value) => msg.priority == *value,
            Self::PriorityGreaterThan(threshold) => msg.priority > *threshold,
            Self::PriorityLessThan(threshold) => msg.priority < *threshold,
        }
    }
}

fn require<T>(slot: Option<T>, field: Param) -> Result<T, MatchError> {
    slot.ok_or(MatchError::MissingParameter { field })
}

impl TryFrom<&Match> for Condition {
    type Error = MatchError;

    fn try_from(m: &Match) -> Result<Self, Self::Error> {
        Self::compile(m)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::ChannelName(p) => write!(f, "channel_name {p}"),
            Self::UserName(p) => write!(f, "user_name {p}"),
            Self::UserId(id) => write!(f, "user_id {id}"),
            Self::IsAdmin(admin) => write!(f, "is_admin {admin}"),
            Self::MessageTitle(p) => write!(f, "message_title {p}"),
            Self::MessageText(p) => write!(f, "message_text {p}"),
            Self::MessageExtra(p) => write!(f, "message_extra {p}"),
            Self::Priority(v) => write!(f, "priority == {v}"),
            Self::PriorityGreaterThan(v) => write!(f, "priority > {v}"),
            Self::PriorityLessThan(v) => write!(f, "priority < {v}"),
        }
    }
}

/// A rule with compiled conditions and a valid action.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    conditions: Vec<Condition>,
    action: Action,
}

impl CompiledRule {
    /// The compiled conditions, ANDed.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Accept or reject; never [`Action::Unrecognized`].
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// All conditions match (vacuously true when empty).
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        self.conditions.iter().all(|c| c.matches(msg))
    }
}

/// A validated, compiled [`RuleChain`].
///
/// Decisions are identical to [`RuleChain::evaluate`] on the source chain.
///
/// # Example
///
/// ```
/// use gatekeep::{Action, Filter, Match, Message, Rule, RuleChain};
///
/// let chain = RuleChain::new(vec![
///     Rule::new(vec![Match::priority_gt(8)], Action::Reject),
/// ]);
/// let filter = Filter::compile(&chain).unwrap();
/// assert_eq!(filter.evaluate(&Message::new().with_priority(9), Action::Accept), Action::Reject);
/// assert_eq!(filter.evaluate(&Message::new().with_priority(8), Action::Accept), Action::Accept);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter {
    rules: Vec<CompiledRule>,
}

impl Filter {
    /// Validate and compile a chain.
    ///
    /// # Errors
    ///
    /// Returns every fault [`RuleChain::validate`] reports.
    pub fn compile(chain: &RuleChain) -> Result<Self, RuleChainError> {
        chain.validate()?;

        let mut rules = Vec::with_capacity(chain.len());
        for (index, rule) in chain.rules().iter().enumerate() {
            let conditions = rule
                .conditions
                .iter()
                .enumerate()
                .map(|(i, m)| Condition::compile(m).map_err(|e| (i, e)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|(i, e)| {
                    RuleChainError::single(
                        index,
                        RuleFault::Conditions(MatchSetError {
                            errors: vec![(i, e)],
                        }),
                    )
                })?;
            rules.push(CompiledRule {
                conditions,
                action: rule.action.clone(),
            });
        }

        debug!(rules = rules.len(), "compiled filter");
        Ok(Self { rules })
    }

    /// Decide on a message: first matching rule's action, else `default`.
    #[must_use]
    pub fn evaluate(&self, msg: &Message, default: Action) -> Action {
        match self.rules.iter().position(|rule| rule.matches(msg)) {
            Some(index) => {
                trace!(index, "compiled rule matched");
                self.rules[index].action.clone()
            }
            None => default,
        }
    }

    /// The compiled rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TryFrom<&RuleChain> for Filter {
    type Error = RuleChainError;

    fn try_from(chain: &RuleChain) -> Result<Self, Self::Error> {
        Self::compile(chain)
    }
}
