// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence arithmetic shared by the store and the engine.

/// Panics if `value` is not a confidence in [0, 1].
///
/// An out-of-range confidence is a programming error, never corrected silently.
pub fn assert_confidence(value: f64) {
    assert!(
        (0.0..=1.0).contains(&value),
        "confidence {value} outside [0, 1]"
    );
}

/// Saturating reinforcement: `old + (1 - old) * step`.
///
/// The result is never below `old` and never above 1.
pub fn reinforce(old: f64, step: f64) -> f64 {
    assert_confidence(old);
    assert!((0.0..=1.0).contains(&step), "reinforce step {step} outside [0, 1]");
    let new = (old + (1.0 - old) * step).min(1.0);
    assert_confidence(new);
    new
}
