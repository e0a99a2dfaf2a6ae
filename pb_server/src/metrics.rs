//! Prometheus metrics for monitoring the dealer.
//!
//! Metrics are derived from the supervisor's [`SessionEvent`] stream and
//! exposed in Prometheus text format for scraping.
//!
//! # Metrics
//!
//! - `sessions_started_total`, `sessions_finished_total{end}`
//! - `sessions_active`
//! - `rounds_requested_total`
//! - `rounds_played_total{outcome}`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pb_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use private_blackjack::{Outcome, SessionEnd, SessionEvent};
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Errors
///
/// Returns an error message if the exporter can't be installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Label for a finished session.
pub fn end_label(end: &SessionEnd) -> &'static str {
    match end {
        SessionEnd::Completed(_) => "completed",
        SessionEnd::ProtocolViolation(_) => "protocol_violation",
        SessionEnd::Disconnected(_) => "disconnected",
    }
}

/// Label for a round outcome, matching the wire token.
pub fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Win => "win",
        Outcome::Lose => "lose",
        Outcome::Push => "push",
        Outcome::PlayerBlackjack => "blackjack",
        Outcome::PlayerBust => "bust",
        Outcome::DealerBust => "dealer_bust",
    }
}

/// Update every metric affected by `event`.
pub fn record(event: &SessionEvent) {
    match event {
        SessionEvent::Started { .. } => {
            metrics::counter!("sessions_started_total").increment(1);
            metrics::gauge!("sessions_active").increment(1.0);
        }
        SessionEvent::Requested { rounds, .. } => {
            metrics::counter!("rounds_requested_total").increment(u64::from(*rounds));
        }
        SessionEvent::RoundSettled { outcome, .. } => {
            metrics::counter!("rounds_played_total",
                "outcome" => outcome_label(*outcome)
            )
            .increment(1);
        }
        SessionEvent::Finished { end, .. } => {
            metrics::counter!("sessions_finished_total",
                "end" => end_label(end)
            )
            .increment(1);
            metrics::gauge!("sessions_active").decrement(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use private_blackjack::Tally;

    #[test]
    fn test_labels() {
        assert_eq!(outcome_label(Outcome::DealerBust), "dealer_bust");
        assert_eq!(
            end_label(&SessionEnd::ProtocolViolation(String::new())),
            "protocol_violation"
        );
        assert_eq!(end_label(&SessionEnd::Completed(Tally::default())), "completed");
    }

    #[test]
    fn test_record_without_recorder() {
        // No recorder installed: recording is a no-op and must not panic.
        record(&SessionEvent::Requested { id: 1, rounds: 3 });
        record(&SessionEvent::Finished {
            id: 1,
            end: SessionEnd::Disconnected("reset".to_string()),
        });
    }
}
