//! ReDoS safety check for regex rules.
//!
//! Rule patterns come from user-edited configuration, so a pathological
//! expression must not stall message delivery. The `regex` crate runs in
//! linear time; these benches keep that visible.
//!
//! Pattern: `(a+)+$` against `"a" * N + "X"`

use gatekeep::prelude::*;
use gatekeep::{pattern_matches, Pattern};

fn main() {
    divan::main();
}

/// Nested quantifier with anchor.
const REDOS_PATTERN: &str = r"(a+)+$";

/// N 'a's followed by 'X' (forces a full backtrack attempt in backtracking engines).
fn pathological_input(n: usize) -> String {
    "a".repeat(n) + "X"
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pattern only
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 20, 25, 30, 50, 100])]
fn redos_compiled_pattern(bencher: divan::Bencher, n: usize) {
    let pattern = Pattern::new(true, REDOS_PATTERN);
    let input = pathological_input(n);

    bencher.bench_local(|| pattern.is_match(&input));
}

#[divan::bench(args = [10, 50, 100])]
fn redos_interpreted_pattern(bencher: divan::Bencher, n: usize) {
    let input = pathological_input(n);

    bencher.bench_local(|| pattern_matches(true, REDOS_PATTERN, &input));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Full filter (message text rule)
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 20, 50, 100])]
fn redos_full_filter(bencher: divan::Bencher, n: usize) {
    let chain = RuleChain::new(vec![Rule::new(
        vec![Match::message_text(REDOS_PATTERN).with_regex(true)],
        Action::Reject,
    )]);
    let filter = Filter::compile(&chain).unwrap();
    let msg = Message::new().with_text(pathological_input(n));

    bencher.bench_local(|| filter.evaluate(&msg, Action::Accept));
}
