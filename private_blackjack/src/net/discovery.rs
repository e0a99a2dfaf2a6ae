//! Best-effort server discovery over UDP broadcast.
//!
//! The dealer runs a [`Broadcaster`] task that sends a [`DiscoveryOffer`]
//! every second. Clients bind a [`Listener`] on the well-known port and take
//! the first valid offer they hear. Datagrams are unreliable, so anything
//! that fails to decode is dropped without surfacing an error.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket},
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::{
    net::UdpSocket,
    time::{MissedTickBehavior, interval},
};

use super::{
    errors::DiscoveryError,
    offer::{DiscoveryOffer, OFFER_LEN},
};

/// Well-known UDP port offers are sent to.
pub const DISCOVERY_PORT: u16 = 13122;

/// How often the dealer advertises itself.
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Default time a client waits for an offer before giving up.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single blocking receive.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Large enough for any datagram we care about; the rest is truncated.
const RECV_BUF_LEN: usize = 1024;

/// Periodically sends this server's offer to a broadcast address.
#[derive(Debug)]
pub struct Broadcaster {
    socket: UdpSocket,
    target: SocketAddr,
    period: Duration,
    packet: [u8; OFFER_LEN],
}

impl Broadcaster {
    /// Open a broadcast-enabled socket for sending `offer` to `target`.
    pub async fn bind(
        offer: &DiscoveryOffer,
        target: SocketAddr,
        period: Duration,
    ) -> io::Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            "[::]:0".parse().map_err(io::Error::other)?
        };
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            target,
            period,
            packet: offer.encode(),
        })
    }

    /// Send a single offer.
    pub async fn send_once(&self) -> io::Result<()> {
        self.socket.send_to(&self.packet, self.target).await?;
        Ok(())
    }

    /// Broadcast forever. Failed sends are logged and retried on the next
    /// tick.
    pub async fn run(self) {
        info!(
            "broadcasting offers to {} every {:?}",
            self.target, self.period
        );
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = self.send_once().await {
                warn!("offer broadcast to {} failed: {error}", self.target);
            }
        }
    }
}

/// Client-side discovery settings.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    pub port: u16,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DISCOVERY_PORT,
            timeout: DISCOVERY_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Where a discovered server accepts game sessions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerEndpoint {
    pub addr: SocketAddr,
    pub name: String,
}

/// Blocking listener for discovery offers.
#[derive(Debug)]
pub struct Listener {
    socket: StdUdpSocket,
    poll_interval: Duration,
}

impl Listener {
    /// Bind the discovery port on all interfaces. Port 0 picks a free port.
    ///
    /// The port is shared, so several clients on one host can listen at
    /// once.
    pub fn bind(port: u16) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(all(
            unix,
            not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
        ))]
        socket.set_reuse_port(true)?;
        socket.set_broadcast(true)?;
        socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
        Ok(Self {
            socket: socket.into(),
            poll_interval: POLL_INTERVAL,
        })
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait at most `wait` for one datagram. Returns `None` if nothing
    /// arrived or what arrived wasn't a valid offer.
    pub fn recv_offer(&self, wait: Duration) -> io::Result<Option<ServerEndpoint>> {
        // A zero read timeout means "block forever" to the OS.
        let wait = wait.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(wait))?;
        let mut buf = [0; RECV_BUF_LEN];
        let (len, from) = match self.socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        match DiscoveryOffer::decode(&buf[..len]) {
            Ok(offer) => Ok(Some(ServerEndpoint {
                addr: SocketAddr::new(from.ip(), offer.port),
                name: offer.name().to_string(),
            })),
            Err(error) => {
                debug!("dropping datagram from {from}: {error}");
                Ok(None)
            }
        }
    }

    /// Return the first valid offer heard within `timeout`.
    pub fn discover(&self, timeout: Duration) -> Result<ServerEndpoint, DiscoveryError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DiscoveryError::NoServerFound(timeout));
            }
            if let Some(endpoint) = self.recv_offer(remaining.min(self.poll_interval))? {
                info!("received offer from {} at {}", endpoint.name, endpoint.addr);
                return Ok(endpoint);
            }
        }
    }
}

/// Bind the configured port and wait for the first valid offer.
pub fn discover(config: &DiscoveryConfig) -> Result<ServerEndpoint, DiscoveryError> {
    let listener = Listener::bind(config.port)?.with_poll_interval(config.poll_interval);
    info!("listening for offers on UDP port {}", config.port);
    listener.discover(config.timeout)
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;

    use super::*;

    fn listener() -> (Listener, SocketAddr) {
        let listener = Listener::bind(0).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    fn sender() -> UdpSocket {
        UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap()
    }

    #[test]
    fn no_broadcaster_means_no_server_found() {
        let (listener, _) = listener();
        let started = Instant::now();
        let result = listener.discover(Duration::from_secs(5));
        assert!(matches!(result, Err(DiscoveryError::NoServerFound(_))));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(7));
    }

    #[test]
    fn valid_offer_yields_endpoint() {
        let (listener, addr) = listener();
        let offer = DiscoveryOffer::new(4567, "table one");
        sender().send_to(&offer.encode(), addr).unwrap();
        let endpoint = listener.discover(Duration::from_secs(2)).unwrap();
        assert_eq!(endpoint.addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 4567)));
        assert_eq!(endpoint.name, "table one");
    }

    #[test]
    fn malformed_datagrams_are_skipped() {
        let (listener, addr) = listener();
        let sock = sender();
        let mut corrupt = DiscoveryOffer::new(1111, "bad").encode();
        corrupt[1] ^= 0x10;
        sock.send_to(&corrupt, addr).unwrap();
        sock.send_to(b"hello", addr).unwrap();
        sock.send_to(&DiscoveryOffer::new(2222, "good").encode(), addr)
            .unwrap();
        let endpoint = listener.discover(Duration::from_secs(2)).unwrap();
        assert_eq!(endpoint.addr.port(), 2222);
    }

    #[test]
    fn only_malformed_datagrams_times_out() {
        let (listener, addr) = listener();
        sender().send_to(&[0u8; 10], addr).unwrap();
        assert!(matches!(
            listener.discover(Duration::from_millis(400)),
            Err(DiscoveryError::NoServerFound(_))
        ));
    }

    #[test]
    fn first_valid_offer_wins() {
        let (listener, addr) = listener();
        let sock = sender();
        sock.send_to(&DiscoveryOffer::new(3001, "first").encode(), addr)
            .unwrap();
        sock.send_to(&DiscoveryOffer::new(3002, "second").encode(), addr)
            .unwrap();
        let endpoint = listener.discover(Duration::from_secs(2)).unwrap();
        assert_eq!(endpoint.name, "first");
        assert_eq!(endpoint.addr.port(), 3001);
    }

    #[cfg(unix)]
    #[test]
    fn listeners_share_the_discovery_port() {
        let (first, addr) = listener();
        let second = Listener::bind(addr.port()).unwrap();
        assert_eq!(second.local_addr().unwrap().port(), addr.port());

        let waiters: Vec<_> = [first, second]
            .into_iter()
            .map(|listener| std::thread::spawn(move || listener.discover(Duration::from_secs(3))))
            .collect();
        // Unicast datagrams are spread across the sharing sockets by source
        // port, so keep sending from fresh sockets until both have heard one.
        let offer = DiscoveryOffer::new(4242, "shared").encode();
        for _ in 0..100 {
            if waiters.iter().all(|waiter| waiter.is_finished()) {
                break;
            }
            sender().send_to(&offer, addr).unwrap();
            std::thread::sleep(Duration::from_millis(20));
        }
        for waiter in waiters {
            let endpoint = waiter.join().unwrap().unwrap();
            assert_eq!(endpoint.addr.port(), 4242);
            assert_eq!(endpoint.name, "shared");
        }
    }

    #[tokio::test]
    async fn broadcaster_reaches_listener() {
        let (listener, addr) = listener();
        let offer = DiscoveryOffer::new(9999, "dealer");
        let broadcaster = Broadcaster::bind(&offer, addr, Duration::from_millis(50))
            .await
            .unwrap();
        let task = tokio::spawn(broadcaster.run());
        let endpoint = tokio::task::spawn_blocking(move || listener.discover(Duration::from_secs(3)))
            .await
            .unwrap()
            .unwrap();
        task.abort();
        assert_eq!(endpoint.addr.port(), 9999);
        assert_eq!(endpoint.name, "dealer");
    }
}
