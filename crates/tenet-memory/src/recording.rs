// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

/// Register all Tenet metric descriptions.
///
/// Runs on every `MemoryEngine::new`; describing a metric twice is harmless.
pub fn register_metrics() {
    describe_counter!(
        "tenet_merge_outcomes_total",
        "Statements routed through the merge engine, by outcome"
    );
    describe_counter!(
        "tenet_model_fallbacks_total",
        "Model calls that failed or timed out and took the safe default, by stage"
    );
    describe_counter!(
        "tenet_beliefs_retired_total",
        "Beliefs moved out of the active state by maintenance, by reason"
    );
    describe_gauge!("tenet_active_beliefs", "Active beliefs after the last stats call");
}

/// Record one merge-engine decision.
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("tenet_merge_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record a degraded model call.
pub fn record_fallback(stage: &'static str) {
    metrics::counter!("tenet_model_fallbacks_total", "stage" => stage).increment(1);
}

/// Record beliefs retired by a maintenance pass.
pub fn record_retired(reason: &'static str, count: usize) {
    metrics::counter!("tenet_beliefs_retired_total", "reason" => reason).increment(count as u64);
}

/// Set the active belief gauge.
pub fn set_active_beliefs(count: u64) {
    metrics::gauge!("tenet_active_beliefs").set(count as f64);
}
