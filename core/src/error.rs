//! Validation errors.
//!
//! Errors exist at configuration-load time only. Evaluation never fails:
//! a malformed rule simply does not match.
//!
//! Sequence-level errors ([`MatchSetError`], [`RuleChainError`]) are
//! collected exhaustively and carry the index of every offending entry.

use crate::mode::Param;
use std::fmt;
use thiserror::Error;

/// A single [`Match`](crate::Match) is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The mode's required parameter is absent or zero-valued.
    #[error("missing parameter {field}")]
    MissingParameter {
        /// The required slot.
        field: Param,
    },
    /// Parameters the mode does not use hold non-default values.
    #[error("extra parameter(s): {}", join(.fields))]
    ExtraParameter {
        /// Every offending slot, in declaration order.
        fields: Vec<Param>,
    },
    /// The mode tag is not recognized.
    #[error("unsupported mode: {value}")]
    UnsupportedMode {
        /// The tag as written.
        value: String,
    },
}

/// One or more entries of a [`MatchSet`](crate::MatchSet) are malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_indexed("match", .errors))]
pub struct MatchSetError {
    /// `(index, error)` for every invalid entry, in order.
    pub errors: Vec<(usize, MatchError)>,
}

impl MatchSetError {
    /// Indices of the invalid entries.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.errors.iter().map(|(index, _)| *index)
    }
}

/// What is wrong with one [`Rule`](crate::Rule) of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleFault {
    /// The action is neither `accept` nor `reject`.
    #[error("unrecognized action: {value}")]
    InvalidAction {
        /// The action as written.
        value: String,
    },
    /// The rule's conditions are malformed.
    #[error(transparent)]
    Conditions(#[from] MatchSetError),
    /// The rule has no conditions (strict validation only).
    #[error("rule has no conditions")]
    EmptyConditions,
}

/// One or more rules of a [`RuleChain`](crate::RuleChain) are malformed.
///
/// A rule may contribute several faults (e.g. both an invalid action and
/// invalid conditions); each is reported with the rule's index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_indexed("chain", .faults))]
pub struct RuleChainError {
    /// `(index, fault)` pairs, ordered by index.
    pub faults: Vec<(usize, RuleFault)>,
}

impl RuleChainError {
    /// An error for a single rule.
    #[must_use]
    pub fn single(index: usize, fault: RuleFault) -> Self {
        Self {
            faults: vec![(index, fault)],
        }
    }

    /// Distinct indices of rules with faults, ascending.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.faults.iter().map(|(index, _)| *index).collect();
        indices.dedup();
        indices
    }
}

/// `in <what> index <i>: <error>` for each entry, separated by `; `.
fn join_indexed<E: fmt::Display>(what: &str, entries: &[(usize, E)]) -> String {
    entries
        .iter()
        .map(|(index, error)| format!("in {what} index {index}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn join(fields: &[Param]) -> String {
    fields
        .iter()
        .map(|p| p.key())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_error_messages() {
        assert_eq!(
            MatchError::MissingParameter {
                field: Param::IsAdmin
            }
            .to_string(),
            "missing parameter is_admin"
        );
        assert_eq!(
            MatchError::ExtraParameter {
                fields: vec![Param::UserName, Param::Priority]
            }
            .to_string(),
            "extra parameter(s): user_name, priority"
        );
        assert_eq!(
            MatchError::UnsupportedMode {
                value: "sender_ip".into()
            }
            .to_string(),
            "unsupported mode: sender_ip"
        );
    }

    #[test]
    fn chain_error_names_every_index() {
        let err = RuleChainError {
            faults: vec![
                (
                    0,
                    RuleFault::Conditions(MatchSetError {
                        errors: vec![(
                            1,
                            MatchError::MissingParameter {
                                field: Param::IsAdmin,
                            },
                        )],
                    }),
                ),
                (
                    2,
                    RuleFault::InvalidAction {
                        value: "???".into(),
                    },
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "in chain index 0: in match index 1: missing parameter is_admin; \
             in chain index 2: unrecognized action: ???"
        );
        assert_eq!(err.indices(), vec![0, 2]);
    }

    #[test]
    fn match_set_error_lists_each_entry() {
        let err = MatchSetError {
            errors: vec![
                (
                    0,
                    MatchError::UnsupportedMode {
                        value: "sender_ip".into(),
                    },
                ),
                (
                    2,
                    MatchError::ExtraParameter {
                        fields: vec![Param::UserId],
                    },
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "in match index 0: unsupported mode: sender_ip; \
             in match index 2: extra parameter(s): user_id"
        );
        assert_eq!(err.indices().collect::<Vec<_>>(), vec![0, 2]);
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn indices_are_deduplicated() {
        let err = RuleChainError {
            faults: vec![
                (
                    3,
                    RuleFault::InvalidAction {
                        value: "drop".into(),
                    },
                ),
                (3, RuleFault::EmptyConditions),
            ],
        };
        assert_eq!(err.indices(), vec![3]);
    }
}
