//! Structured logging configuration.
//!
//! The dealer library logs through the `log` facade; those records are
//! bridged into `tracing` so everything ends up in one subscriber.

use private_blackjack::{SessionEnd, SessionEvent};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use pb_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a session lifecycle event with structured fields
///
/// # Example
///
/// ```
/// use pb_server::logging::log_session_event;
/// use private_blackjack::SessionEvent;
///
/// log_session_event(&SessionEvent::Requested { id: 1, rounds: 3 });
/// ```
pub fn log_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::Started { id, peer } => {
            tracing::info!(session_id = id, peer = %peer, "Session started");
        }
        SessionEvent::Requested { id, rounds } => {
            tracing::debug!(session_id = id, rounds = rounds, "Rounds requested");
        }
        SessionEvent::RoundSettled { id, round, outcome } => {
            tracing::debug!(
                session_id = id,
                round = round,
                outcome = ?outcome,
                "Round settled"
            );
        }
        SessionEvent::Finished { id, end } => match end {
            SessionEnd::Completed(tally) => tracing::info!(
                session_id = id,
                wins = tally.total_wins(),
                losses = tally.total_losses(),
                pushes = tally.pushes,
                "Session completed"
            ),
            SessionEnd::ProtocolViolation(reason) => tracing::warn!(
                session_id = id,
                reason = reason.as_str(),
                "PROTOCOL: Session terminated"
            ),
            SessionEnd::Disconnected(reason) => tracing::info!(
                session_id = id,
                reason = reason.as_str(),
                "Session disconnected"
            ),
        },
    }
}
