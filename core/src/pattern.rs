//! Pattern matching shared by every string-based rule
//!
//! A pattern is either compared literally (exact equality) or, with the
//! `regex` flag set, searched for anywhere in the subject. A regex that does
//! not compile never matches; it is not a fault.
//!
//! Two entry points exist:
//!
//! - [`pattern_matches`] / [`any_key_matches`] — interpret a raw pattern on
//!   every call. Used by [`Match::matches`](crate::Match::matches).
//! - [`Pattern`] — compiled once, used by the compiled [`Filter`](crate::Filter).

use regex::Regex;
use std::fmt;
use tracing::warn;

/// Compare `pattern` against `subject`.
///
/// - `regex == false`: exact, case-sensitive equality.
/// - `regex == true`: unanchored search. Invalid expressions never match.
///
/// # Example
///
/// ```
/// use gatekeep::pattern_matches;
///
/// assert!(pattern_matches(false, "title", "title"));
/// assert!(!pattern_matches(false, "t...e", "title"));
/// assert!(pattern_matches(true, "t...e", "title"));
/// assert!(pattern_matches(true, "itl", "title")); // search, not full match
/// assert!(!pattern_matches(true, "[bad", "[bad"));
/// ```
#[must_use]
pub fn pattern_matches(regex: bool, pattern: &str, subject: &str) -> bool {
    if regex {
        Regex::new(pattern).is_ok_and(|re| re.is_match(subject))
    } else {
        pattern == subject
    }
}

/// Returns `true` if any key in `keys` matches `pattern`.
///
/// Iteration order of `keys` does not affect the result. The regex is
/// compiled once per call rather than once per key.
#[must_use]
pub fn any_key_matches<'a>(
    regex: bool,
    pattern: &str,
    keys: impl IntoIterator<Item = &'a str>,
) -> bool {
    let mut keys = keys.into_iter();
    if regex {
        match Regex::new(pattern) {
            Ok(re) => keys.any(|key| re.is_match(key)),
            Err(_) => false,
        }
    } else {
        keys.any(|key| key == pattern)
    }
}

/// A pattern compiled once for repeated evaluation.
///
/// `Clone` is cheap for regexes (the compiled program is shared).
#[derive(Clone)]
pub enum Pattern {
    /// Exact string equality.
    Literal(String),
    /// Unanchored regular expression search (RE2 semantics, linear time).
    Regex(Regex),
    /// A regex that failed to compile. Never matches.
    Invalid {
        /// The pattern as written in configuration.
        pattern: String,
    },
}

impl Pattern {
    /// Compile `pattern`, as a regex when `regex` is set.
    ///
    /// Compilation failures are logged and produce [`Pattern::Invalid`].
    pub fn new(regex: bool, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if !regex {
            return Self::Literal(pattern);
        }
        match Regex::new(&pattern) {
            Ok(re) => Self::Regex(re),
            Err(e) => {
                warn!(%pattern, error = %e, "regex does not compile, rule will never match");
                Self::Invalid { pattern }
            }
        }
    }

    /// Returns `true` if the subject matches.
    #[must_use]
    pub fn is_match(&self, subject: &str) -> bool {
        match self {
            Self::Literal(expected) => expected == subject,
            Self::Regex(re) => re.is_match(subject),
            Self::Invalid { .. } => false,
        }
    }

    /// Returns `true` if any of `keys` matches.
    #[must_use]
    pub fn matches_any<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        keys.into_iter().any(|key| self.is_match(key))
    }

    /// The pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(p) | Self::Invalid { pattern: p } => p,
            Self::Regex(re) => re.as_str(),
        }
    }

    /// Returns `true` for regex patterns that failed to compile.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(p) => f.debug_tuple("Literal").field(p).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Invalid { pattern } => f.debug_tuple("Invalid").field(pattern).finish(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(p) => write!(f, "\"{p}\""),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Invalid { pattern } => write!(f, "/{pattern}/ (invalid)"),
        }
    }
}
