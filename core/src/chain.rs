//! `RuleChain` — ordered rules with first-match-wins semantics
//!
//! The chain is the decision entry point: it walks its rules in declaration
//! order and returns the action of the first one whose conditions match,
//! or the caller's default when none does.

use crate::error::{RuleChainError, RuleFault};
use crate::trace::{EvalStep, EvalTrace};
use crate::{Action, Message, Rule};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Ordered list of [`Rule`]s.
///
/// Serialized as a plain list of rules.
///
/// # INV: First-match-wins
///
/// Rules are evaluated in order. The first matching rule terminates
/// evaluation, even if later rules would also match. Order is the only
/// precedence: there is no priority or specificity ranking.
///
/// # Concurrency
///
/// Evaluation and validation only read the chain, so one chain can be shared
/// (`&RuleChain`, `Arc<RuleChain>`) across any number of threads. Replacing a
/// chain on reload is the owner's job.
///
/// # Example
///
/// ```
/// use gatekeep::{Action, Match, Message, Rule, RuleChain, UserContext};
///
/// let chain = RuleChain::new(vec![
///     Rule::new(vec![Match::user_name("alice")], Action::Reject),
///     Rule::new(vec![Match::any()], Action::Accept),
/// ]);
/// assert!(chain.validate().is_ok());
///
/// let from = |name: &str| Message::new().with_sender(UserContext::new(9, name, false));
/// assert_eq!(chain.evaluate(&from("alice"), Action::Accept), Action::Reject);
/// assert_eq!(chain.evaluate(&from("bob"), Action::Reject), Action::Accept);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Create a chain from rules in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Create an empty chain.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
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

    /// Decide on a message.
    ///
    /// Returns the action of the first rule whose conditions all match, or
    /// `default` unchanged if no rule matches. Performs no validation: call
    /// [`validate`](Self::validate) once when the chain is loaded. On an
    /// unvalidated chain a matching rule's [`Action::Unrecognized`] is
    /// returned as is.
    #[must_use]
    pub fn evaluate(&self, msg: &Message, default: Action) -> Action {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.matches(msg) {
                trace!(index, action = %rule.action, "rule matched");
                return rule.action.clone();
            }
        }
        trace!(action = %default, "no rule matched, using default");
        default
    }

    /// Evaluate with full trace for debugging.
    ///
    /// The returned `result` always equals what [`evaluate`](Self::evaluate)
    /// returns for the same arguments.
    #[must_use]
    pub fn evaluate_with_trace(&self, msg: &Message, default: Action) -> EvalTrace {
        let mut steps = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let conditions = rule.conditions.evaluate_with_trace(msg);
            let matched = conditions.iter().all(|c| c.matched);
            steps.push(EvalStep {
                index,
                matched,
                conditions,
            });
            if matched {
                return EvalTrace {
                    result: rule.action.clone(),
                    steps,
                    used_default: false,
                };
            }
        }
        EvalTrace {
            result: default,
            steps,
            used_default: true,
        }
    }

    /// Validate every rule, collecting all faults.
    ///
    /// Each rule's action must be `accept` or `reject` and its conditions
    /// must validate. Rules with an empty condition list are allowed and
    /// match every message.
    ///
    /// # Errors
    ///
    /// Returns [`RuleChainError`] with the index of every faulty rule.
    pub fn validate(&self) -> Result<(), RuleChainError> {
        self.collect_faults(false)
    }

    /// Like [`validate`](Self::validate), but also rejects rules without
    /// conditions ([`RuleFault::EmptyConditions`]).
    ///
    /// # Errors
    ///
    /// Returns [`RuleChainError`] with the index of every faulty rule.
    pub fn validate_strict(&self) -> Result<(), RuleChainError> {
        self.collect_faults(true)
    }

    fn collect_faults(&self, strict: bool) -> Result<(), RuleChainError> {
        let mut faults = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            faults.extend(rule.faults().into_iter().map(|fault| (index, fault)));
            if strict && rule.conditions.is_empty() {
                faults.push((index, RuleFault::EmptyConditions));
            }
        }
        if faults.is_empty() {
            Ok(())
        } else {
            Err(RuleChainError { faults })
        }
    }
}

impl From<Vec<Rule>> for RuleChain {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<Rule> for RuleChain {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleChain {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Match, MatchSet, Mode, UserContext};

    fn test_message() -> Message {
        Message::new()
            .with_sender(UserContext::new(1, "sender", true))
            .with_receiver(UserContext::new(2, "receiver", false))
            .with_title("title")
            .with_text("message")
            .with_extra("test::string", serde_json::json!("string"))
            .with_priority(5)
            .with_channel("test_channel")
    }

    fn rule(m: Match, action: Action) -> Rule {
        Rule::new(vec![m], action)
    }

    #[test]
    fn empty_chain_returns_default() {
        let chain = RuleChain::empty();
        assert_eq!(chain.evaluate(&test_message(), Action::Reject), Action::Reject);
        assert_eq!(chain.evaluate(&test_message(), Action::Accept), Action::Accept);
    }

    #[test]
    fn first_match_wins() {
        let chain = RuleChain::new(vec![
            rule(Match::priority(5), Action::Reject),
            rule(Match::any(), Action::Accept),
        ]);
        assert_eq!(chain.evaluate(&test_message(), Action::Accept), Action::Reject);

        // Both rules match: swapping them changes the decision.
        let swapped = RuleChain::new(vec![
            rule(Match::any(), Action::Accept),
            rule(Match::priority(5), Action::Reject),
        ]);
        assert_eq!(swapped.evaluate(&test_message(), Action::Accept), Action::Accept);
    }

    #[test]
    fn disjoint_rules_commute() {
        let a = rule(Match::priority(5), Action::Reject);
        let b = rule(Match::priority(7), Action::Accept);
        let forward = RuleChain::new(vec![a.clone(), b.clone()]);
        let backward = RuleChain::new(vec![b, a]);
        for priority in [5, 6, 7] {
            let msg = test_message().with_priority(priority);
            assert_eq!(
                forward.evaluate(&msg, Action::Accept),
                backward.evaluate(&msg, Action::Accept),
                "priority {priority}"
            );
        }
    }

    #[test]
    fn sender_is_admin() {
        let chain = RuleChain::new(vec![rule(Match::is_admin(true), Action::Accept)]);
        assert_eq!(chain.evaluate(&test_message(), Action::Reject), Action::Accept);
    }

    #[test]
    fn has_extra() {
        let chain = RuleChain::new(vec![rule(
            Match::message_extra("test::*").with_regex(true),
            Action::Reject,
        )]);
        assert_eq!(chain.evaluate(&test_message(), Action::Accept), Action::Reject);
    }

    #[test]
    fn conditions_are_anded() {
        let chain = RuleChain::new(vec![
            Rule::new(
                vec![
                    Match::message_extra("test::*").with_regex(true),
                    Match::message_title("not_title"),
                ],
                Action::Reject,
            ),
            Rule::new(
                vec![
                    Match::message_extra("test::*").with_regex(true),
                    Match::message_title("title"),
                ],
                Action::Accept,
            ),
        ]);
        assert_eq!(chain.evaluate(&test_message(), Action::Reject), Action::Accept);
    }

    #[test]
    fn empty_conditions_match_everything() {
        let deny_all = RuleChain::new(vec![Rule::new(MatchSet::default(), Action::Reject)]);
        assert_eq!(deny_all.evaluate(&test_message(), Action::Accept), Action::Reject);
        assert_eq!(deny_all.evaluate(&Message::new(), Action::Accept), Action::Reject);
        assert!(deny_all.validate().is_ok());
    }

    #[test]
    fn strict_validation_rejects_empty_conditions() {
        let chain = RuleChain::new(vec![
            rule(Match::any(), Action::Accept),
            Rule::new(MatchSet::default(), Action::Reject),
        ]);
        let err = chain.validate_strict().unwrap_err();
        assert_eq!(err.faults, vec![(1, RuleFault::EmptyConditions)]);
    }

    #[test]
    fn validation_reports_every_faulty_index() {
        let mut rules = vec![rule(Match::any(), Action::Accept)];
        assert!(RuleChain::new(rules.clone()).validate().is_ok());

        rules.insert(0, rule(Match::user_id(1), Action::from("???")));
        let err = RuleChain::new(rules.clone()).validate().unwrap_err();
        assert_eq!(err.indices(), vec![0]);

        rules.insert(0, rule(Match::new(Mode::IsAdmin), Action::Reject));
        let err = RuleChain::new(rules).validate().unwrap_err();
        assert_eq!(err.indices(), vec![0, 1]);
    }

    #[test]
    fn rule_with_two_faults_reports_both() {
        let chain = RuleChain::new(vec![rule(Match::new(Mode::IsAdmin), Action::from("drop"))]);
        let err = chain.validate().unwrap_err();
        assert_eq!(err.faults.len(), 2);
        assert_eq!(err.indices(), vec![0]);
    }

    #[test]
    fn unvalidated_chain_still_decides() {
        let chain = RuleChain::new(vec![
            rule(Match::new(Mode::from("bogus")), Action::Reject),
            rule(Match::new(Mode::Priority), Action::Reject),
        ]);
        assert!(chain.validate().is_err());
        assert_eq!(chain.evaluate(&test_message(), Action::Accept), Action::Accept);
    }

    #[test]
    fn trace_agrees_with_evaluate() {
        let chain = RuleChain::new(vec![
            Rule::new(
                vec![Match::user_name("nobody"), Match::priority(5)],
                Action::Reject,
            ),
            rule(Match::channel_name("test_channel"), Action::Accept),
            rule(Match::any(), Action::Reject),
        ]);
        let msg = test_message();
        let trace = chain.evaluate_with_trace(&msg, Action::Reject);

        assert_eq!(trace.result, chain.evaluate(&msg, Action::Reject));
        assert_eq!(trace.result, Action::Accept);
        assert!(!trace.used_default);
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.decided_by(), Some(1));
        // No short-circuit inside a traced rule.
        assert_eq!(trace.steps[0].conditions.len(), 2);
        assert!(!trace.steps[0].conditions[0].matched);
        assert!(trace.steps[0].conditions[1].matched);
    }

    #[test]
    fn trace_reports_default() {
        let chain = RuleChain::new(vec![rule(Match::priority(1), Action::Reject)]);
        let trace = chain.evaluate_with_trace(&test_message(), Action::Accept);
        assert!(trace.used_default);
        assert_eq!(trace.result, Action::Accept);
        assert_eq!(trace.steps.len(), 1);
    }

    #[test]
    fn deserializes_config_shape() {
        let yaml = r"
- match:
    - mode: is_admin
      is_admin: true
  action: accept
- match:
    - mode: any
  action: reject
";
        let chain: RuleChain = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.validate().is_ok());
        assert_eq!(chain.evaluate(&test_message(), Action::Reject), Action::Accept);
    }

    #[test]
    fn chain_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleChain>();
    }
}
