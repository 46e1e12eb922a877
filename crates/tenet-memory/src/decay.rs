// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time decay of belief confidence.
//!
//! `effective = confidence * 0.5^(age_days / half_life_days)`, with age
//! measured from the last creation or reinforcement.

use chrono::{DateTime, Utc};
use tenet_core::Belief;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decay multiplier for an age in days. 1.0 at or before age zero.
pub fn decay_factor(age_days: f64, half_life_days: f64) -> f64 {
    assert!(half_life_days > 0.0, "decay half-life must be positive");
    if age_days <= 0.0 {
        return 1.0;
    }
    0.5f64.powf(age_days / half_life_days)
}

/// Days since `belief` was last created or reinforced, as seen at `now`.
pub fn age_days(belief: &Belief, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(belief.updated_at);
    elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Confidence after decay, in [0, stored confidence].
pub fn effective_confidence(belief: &Belief, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    belief.confidence * decay_factor(age_days(belief, now), half_life_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use tenet_core::BeliefType;

    fn belief_aged(confidence: f64, days: i64, now: DateTime<Utc>) -> Belief {
        let mut b = Belief::new("aged", confidence, BeliefType::Factual, "owner");
        b.updated_at = now - Duration::days(days);
        b
    }

    #[test]
    fn one_half_life_halves_confidence() {
        let now = Utc::now();
        let b = belief_aged(0.8, 60, now);
        assert!((effective_confidence(&b, now, 60.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn fresh_belief_is_undecayed() {
        let now = Utc::now();
        let b = belief_aged(0.6, 0, now);
        assert_eq!(effective_confidence(&b, now, 60.0), 0.6);
    }

    #[test]
    fn future_timestamp_does_not_boost() {
        let now = Utc::now();
        let b = belief_aged(0.6, -3, now);
        assert_eq!(effective_confidence(&b, now, 60.0), 0.6);
    }

    #[test]
    fn long_idle_belief_falls_below_prune_threshold() {
        let now = Utc::now();
        let b = belief_aged(0.6, 365, now);
        assert!(effective_confidence(&b, now, 60.0) < 0.05);
    }

    proptest! {
        #[test]
        fn decay_is_monotone_in_time(
            confidence in 0.0f64..=1.0,
            t1 in 0i64..2000,
            dt in 0i64..2000,
            half_life in 1.0f64..400.0,
        ) {
            let now = Utc::now();
            let b = belief_aged(confidence, 0, now);
            let e1 = effective_confidence(&b, now + Duration::days(t1), half_life);
            let e2 = effective_confidence(&b, now + Duration::days(t1 + dt), half_life);
            prop_assert!(e2 <= e1);
            prop_assert!((0.0..=confidence).contains(&e2));
        }
    }
}
