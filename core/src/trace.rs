//! Evaluation trace types for debugging rule chains.
//!
//! [`RuleChain::evaluate_with_trace`](crate::RuleChain::evaluate_with_trace)
//! returns the same decision as `evaluate()` plus the path taken: which
//! rules were tried, and how each of their conditions evaluated.
//!
//! # Example
//!
//! ```ignore
//! let trace = chain.evaluate_with_trace(&msg, Action::Accept);
//! println!("Result: {}", trace.result);
//! for step in &trace.steps {
//!     println!("  rule[{}]: matched={}", step.index, step.matched);
//! }
//! ```

use crate::{Action, Mode};
use std::fmt;

/// Result of one [`Match`](crate::Match) inside a traced rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTrace {
    /// Index in the rule's match list (0-based).
    pub index: usize,
    /// Mode of the match.
    pub mode: Mode,
    /// Whether the match matched.
    pub matched: bool,
}

/// One rule's evaluation in a trace.
///
/// All conditions of the rule are evaluated (no short-circuit) for
/// visibility. `matched` is still the conjunction of their results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalStep {
    /// Index in the chain (0-based).
    pub index: usize,
    /// Did every condition match?
    pub matched: bool,
    /// Per-condition results.
    pub conditions: Vec<ConditionTrace>,
}

/// Trace of a full chain evaluation.
///
/// # INV: `result` == `evaluate()` result
///
/// Steps stop after the first matching rule, preserving first-match-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The decision (identical to what `evaluate()` returns).
    pub result: Action,
    /// Every rule that was tried, in order.
    pub steps: Vec<EvalStep>,
    /// Whether no rule matched and the default action was returned.
    pub used_default: bool,
}

impl EvalTrace {
    /// Index of the rule that decided, `None` if the default was used.
    #[must_use]
    pub fn decided_by(&self) -> Option<usize> {
        self.steps.iter().find(|s| s.matched).map(|s| s.index)
    }
}

impl fmt::Display for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            let verdict = if step.matched { "match" } else { "no match" };
            writeln!(f, "rule[{}]: {verdict}", step.index)?;
            for c in &step.conditions {
                writeln!(f, "  [{}] {}: {}", c.index, c.mode, c.matched)?;
            }
        }
        if self.used_default {
            writeln!(f, "no rule matched, default applies")?;
        }
        write!(f, "result: {}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(index: usize, matched: bool) -> EvalStep {
        EvalStep {
            index,
            matched,
            conditions: vec![ConditionTrace {
                index: 0,
                mode: Mode::UserName,
                matched,
            }],
        }
    }

    #[test]
    fn decided_by_first_matching_step() {
        let trace = EvalTrace {
            result: Action::Reject,
            steps: vec![step(0, false), step(1, true)],
            used_default: false,
        };
        assert_eq!(trace.decided_by(), Some(1));
    }

    #[test]
    fn decided_by_none_when_default() {
        let trace = EvalTrace {
            result: Action::Accept,
            steps: vec![step(0, false)],
            used_default: true,
        };
        assert_eq!(trace.decided_by(), None);
    }

    #[test]
    fn display_lists_path() {
        let trace = EvalTrace {
            result: Action::Reject,
            steps: vec![step(0, false), step(1, true)],
            used_default: false,
        };
        let text = trace.to_string();
        assert!(text.contains("rule[0]: no match"));
        assert!(text.contains("[0] user_name: true"));
        assert!(text.ends_with("result: reject"));
    }
}
