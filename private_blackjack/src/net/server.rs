//! Session supervisor.
//!
//! The server binds a TCP listener, advertises it with a discovery
//! [`Broadcaster`] and spawns one [`Session`] task per accepted connection.
//! Sessions share nothing; a failing session ends its own task and the
//! accept loop carries on.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use log::{error, info};
use tokio::{net::TcpListener, sync::mpsc, task::JoinSet};

use super::{
    discovery::{BROADCAST_INTERVAL, Broadcaster, DISCOVERY_PORT},
    offer::DiscoveryOffer,
    session::{Session, SessionConfig, SessionEvent, SessionId},
};

/// Name advertised when none is configured.
pub const DEFAULT_SERVER_NAME: &str = "Blackijecky";

/// Pause after a failed accept so a persistent error doesn't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Advertised server name, truncated to 32 bytes on the wire.
    pub name: String,
    /// TCP address for game sessions. Port 0 picks a free port.
    pub bind: SocketAddr,
    /// Where offers are sent. `None` disables advertising.
    pub broadcast: Option<SocketAddr>,
    pub broadcast_interval: Duration,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            bind: (Ipv4Addr::UNSPECIFIED, 0).into(),
            broadcast: Some((Ipv4Addr::BROADCAST, DISCOVERY_PORT).into()),
            broadcast_interval: BROADCAST_INTERVAL,
            session: SessionConfig::default(),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        Ok(Self {
            listener,
            config,
            events: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Report every session's lifecycle on `events`.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Advertise and accept connections until the future is dropped.
    /// Dropping it also stops the broadcaster and every running session.
    pub async fn run(self) -> io::Result<()> {
        let port = self.local_addr()?.port();
        info!("server '{}' accepting sessions on port {port}", self.config.name);

        let mut tasks = JoinSet::new();
        if let Some(target) = self.config.broadcast {
            let offer = DiscoveryOffer::new(port, &self.config.name);
            let broadcaster =
                Broadcaster::bind(&offer, target, self.config.broadcast_interval).await?;
            tasks.spawn(broadcaster.run());
        }

        let mut next_id: SessionId = 0;
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        if let Err(error) = stream.set_nodelay(true) {
                            error!("can't set TCP_NODELAY for {peer}: {error}");
                        }
                        let mut session =
                            Session::new(next_id, peer, stream, self.config.session.clone());
                        if let Some(events) = &self.events {
                            session = session.with_events(events.clone());
                        }
                        tasks.spawn(async move {
                            session.run().await;
                        });
                    }
                    Err(error) => {
                        error!("accept failed: {error}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = tasks.join_next() => {
                    if let Err(error) = joined {
                        error!("session task failed: {error}");
                    }
                }
            }
        }
    }
}

/// Bind with `config` and serve forever.
pub async fn run(config: ServerConfig) -> io::Result<()> {
    Server::bind(config).await?.run().await
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::TcpStream,
    };

    use super::*;
    use crate::net::session::SessionEnd;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            broadcast: None,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn default_config_broadcasts_on_well_known_port() {
        let config = ServerConfig::default();
        assert_eq!(
            config.broadcast,
            Some("255.255.255.255:13122".parse().unwrap())
        );
        assert_eq!(config.broadcast_interval, Duration::from_secs(1));
        assert_eq!(config.name, DEFAULT_SERVER_NAME);
    }

    #[tokio::test]
    async fn accepts_and_reports_sessions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = Server::bind(test_config()).await.unwrap().with_events(tx);
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"nope\n").await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        assert!(line.starts_with("ERROR "));

        assert!(matches!(rx.recv().await, Some(SessionEvent::Started { id: 1, .. })));
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Finished {
                id: 1,
                end: SessionEnd::ProtocolViolation(_)
            })
        ));
        handle.abort();
    }
}
