//! gatekeep - rule-based broadcast filtering
//!
//! Decides whether a broadcast message should be delivered, by evaluating an
//! ordered chain of accept/reject rules against the message.
//!
//! # Architecture
//!
//! Configuration form (serializable, validated at load time):
//!
//! - [`Match`] — one predicate, selected by its [`Mode`]
//! - [`MatchSet`] — conjunction of matches
//! - [`Rule`] — a `MatchSet` plus an [`Action`]
//! - [`RuleChain`] — ordered rules with first-match-wins semantics
//! - [`FilterConfig`] — a user's channels plus sender/receiver chains
//!
//! Runtime form (compiled once, immutable):
//!
//! - [`Condition`] — one variant per mode, patterns precompiled
//! - [`Filter`] — compiled `RuleChain`
//!
//! # Key Invariants
//!
//! 1. **Evaluation never fails**: absent parameters, unsupported modes and
//!    malformed regexes all evaluate to `false`.
//!
//! 2. **First match wins**: the first rule whose conditions all match
//!    decides; the caller's default applies when none does.
//!
//! 3. **Direction picks the participant**: user-based modes test the
//!    receiver of an outbound message and the sender of an inbound one.
//!
//! # Example
//!
//! ```
//! use gatekeep::prelude::*;
//!
//! let chain = RuleChain::new(vec![
//!     Rule::new(
//!         vec![
//!             Match::user_name("my_server"),
//!             Match::message_text(r"^\[(INFO|DEBUG)\]").with_regex(true),
//!         ],
//!         Action::Reject,
//!     ),
//!     Rule::new(vec![Match::any()], Action::Accept),
//! ]);
//! chain.validate().unwrap();
//!
//! let msg = Message::new()
//!     .with_sender(UserContext::new(1, "my_server", false))
//!     .with_text("[INFO] heartbeat");
//! assert_eq!(chain.evaluate(&msg, Action::Accept), Action::Reject);
//!
//! let filter = Filter::compile(&chain).unwrap();
//! assert_eq!(filter.evaluate(&msg, Action::Accept), Action::Reject);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod chain;
mod config;
mod error;
mod filter;
mod message;
mod mode;
mod pattern;
mod predicate;
mod rule;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use chain::RuleChain;
pub use message::{Message, UserContext};
pub use mode::{Mode, Param};
pub use predicate::{Match, MatchSet};
pub use rule::{Action, Rule};

// Pattern matching
pub use pattern::{any_key_matches, pattern_matches, Pattern};

// Compiled form
pub use filter::{CompiledRule, Condition, Filter};

// Configuration
pub use config::{ChannelDef, CompiledConfig, ConfigError, FilterConfig, DEFAULT_ACTION};

// Errors
pub use error::{MatchError, MatchSetError, RuleChainError, RuleFault};

// Trace types
pub use trace::{ConditionTrace, EvalStep, EvalTrace};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use gatekeep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core types
        Action,
        // Compiled form
        CompiledConfig,
        Condition,
        // Trace types
        EvalTrace,
        Filter,
        // Configuration
        FilterConfig,
        Match,
        // Errors
        MatchError,
        MatchSet,
        Message,
        Mode,
        Rule,
        RuleChain,
        RuleChainError,
        UserContext,
    };
}
