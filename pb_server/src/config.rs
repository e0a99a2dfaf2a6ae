//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use private_blackjack::{
    ServerConfig, SessionConfig,
    discovery::{BROADCAST_INTERVAL, DISCOVERY_PORT},
    net::{
        offer::NAME_LEN,
        session::{MAX_ROUNDS, SESSION_TIMEOUT},
    },
    server::DEFAULT_SERVER_NAME,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Values given on the command line. Each one wins over its environment
/// variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub name: Option<String>,
    pub discovery_port: Option<u16>,
    pub broadcast: Option<String>,
    pub seed: Option<u64>,
    pub metrics: Option<SocketAddr>,
}

/// Complete server configuration loaded from flags and environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dealer settings handed to the library
    pub server: ServerConfig,
    /// Prometheus exporter address, if metrics are enabled
    pub metrics: Option<SocketAddr>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to something unusable
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))),
        };

        let name = overrides
            .name
            .or_else(|| std::env::var("SERVER_NAME").ok())
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        let discovery_port = match overrides.discovery_port {
            Some(port) => port,
            None => parse_env("DISCOVERY_PORT")?.unwrap_or(DISCOVERY_PORT),
        };

        let broadcast_addr = overrides
            .broadcast
            .or_else(|| std::env::var("BROADCAST_ADDR").ok());
        let broadcast = parse_broadcast(broadcast_addr.as_deref(), discovery_port)?;

        let broadcast_interval = Duration::from_millis(
            parse_env("BROADCAST_INTERVAL_MS")?.unwrap_or(duration_millis(BROADCAST_INTERVAL)),
        );
        let idle_timeout = Duration::from_secs(
            parse_env("SESSION_TIMEOUT_SECS")?.unwrap_or(SESSION_TIMEOUT.as_secs()),
        );
        let max_rounds = parse_env("MAX_ROUNDS")?.unwrap_or(MAX_ROUNDS);

        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => parse_env("GAME_SEED")?,
        };

        let metrics = match overrides.metrics {
            Some(addr) => Some(addr),
            None => parse_env("METRICS_BIND")?,
        };

        Ok(AppConfig {
            server: ServerConfig {
                name,
                bind,
                broadcast,
                broadcast_interval,
                session: SessionConfig {
                    idle_timeout,
                    max_rounds,
                    seed,
                },
            },
            metrics,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "SERVER_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.server.name.len() > NAME_LEN {
            log::warn!(
                "server name '{}' is longer than {NAME_LEN} bytes and will be truncated in offers",
                self.server.name
            );
        }

        if self.server.session.max_rounds == 0 || self.server.session.max_rounds > MAX_ROUNDS {
            return Err(ConfigError::Invalid {
                var: "MAX_ROUNDS".to_string(),
                reason: format!("Must be between 1 and {MAX_ROUNDS}"),
            });
        }

        if self.server.session.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SESSION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.server.broadcast_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BROADCAST_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self
            .metrics
            .is_some_and(|metrics| metrics == self.server.bind && metrics.port() != 0)
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Collides with the game listener ({})", self.server.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// `off` disables advertising; anything else must be an IP address.
fn parse_broadcast(value: Option<&str>, port: u16) -> Result<Option<SocketAddr>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(Some(SocketAddr::from((Ipv4Addr::BROADCAST, port)))),
        Some(value) if value.eq_ignore_ascii_case("off") => Ok(None),
        Some(value) => value
            .parse::<IpAddr>()
            .map(|ip| Some(SocketAddr::new(ip, port)))
            .map_err(|e| ConfigError::Invalid {
                var: "BROADCAST_ADDR".to_string(),
                reason: e.to_string(),
            }),
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parse an optional environment variable, failing loudly on garbage
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
