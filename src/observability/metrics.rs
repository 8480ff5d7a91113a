//! Metrics collection.
//!
//! # Metrics
//! - `anchor_submissions_total` (counter): by network, outcome
//! - `anchor_status_lookups_total` (counter): by network, outcome
//! - `anchor_session_transitions_total` (counter): by network, phase
//! - `anchor_client_ready` (gauge): 1=ready, 0=degraded, by network
//!
//! Updates go through the `metrics` facade; without an installed recorder
//! they are no-ops.

use metrics::{counter, gauge};

use crate::blockchain::types::NetworkId;

pub fn record_anchor_submission(network: NetworkId, outcome: &'static str) {
    counter!(
        "anchor_submissions_total",
        "network" => network.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_status_lookup(network: NetworkId, outcome: &'static str) {
    counter!(
        "anchor_status_lookups_total",
        "network" => network.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_session_transition(network: NetworkId, phase: &'static str) {
    counter!(
        "anchor_session_transitions_total",
        "network" => network.as_str(),
        "phase" => phase
    )
    .increment(1);
}

pub fn record_client_ready(network: NetworkId, ready: bool) {
    gauge!("anchor_client_ready", "network" => network.as_str()).set(if ready { 1.0 } else { 0.0 });
}
