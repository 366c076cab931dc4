//! # libp2p Connector
//!
//! Reachability check over the libp2p stack the pillar orchestrators speak:
//! TCP, noise, yamux. A peer counts as reachable only once a connection is
//! established and the noise handshake proved the remote holds the key of
//! the claimed peer identifier. Anything listening on a stale address with a
//! different key is reported as unreachable.
//!
//! DNS multiaddrs are resolved up front with the tokio resolver, so the
//! swarm itself only ever dials IP addresses.
//!
//! The local identity is an ed25519 keypair, either generated per run or
//! derived from a hex-encoded 32-byte seed.

use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use futures_util::StreamExt;
use libp2p::identity::Keypair;
use libp2p::swarm::dial_opts::DialOpts;
use libp2p::swarm::{dummy, DialError, SwarmEvent};
use libp2p::{noise, tcp, yamux, Swarm, SwarmBuilder};
use multiaddr::{Multiaddr, Protocol};
use rand::rngs::OsRng;
use tracing::{debug, info};

use crate::domain::{HealthError, PeerIdentifier, TransportError};
use crate::ports::PeerConnector;

/// Connections are dropped as soon as they go idle; only the handshake
/// matters.
const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a swarm with no protocols beyond the transport upgrade. Used for
/// dialing, and for listening when a node identity must be served.
pub fn build_swarm(keypair: Keypair) -> Result<Swarm<dummy::Behaviour>, TransportError> {
    let swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_tcp(
            tcp::Config::default(),
            noise::Config::new,
            yamux::Config::default,
        )
        .map_err(|e| TransportError::ConnectionFailed(format!("TCP transport error: {}", e)))?
        .with_behaviour(|_| dummy::Behaviour)
        .map_err(|e| TransportError::ConnectionFailed(format!("Behaviour error: {}", e)))?
        .with_swarm_config(|c| c.with_idle_connection_timeout(IDLE_CONNECTION_TIMEOUT))
        .build();
    Ok(swarm)
}

/// Rewrite `/dns*/<name>/tcp/<port>` into an IP multiaddr. IP addresses pass
/// through; anything not ending in a TCP port is not dialable.
async fn resolve_dial_address(address: &Multiaddr) -> Result<Multiaddr, TransportError> {
    let mut iter = address.iter();
    let (host, port) = match (iter.next(), iter.next(), iter.next()) {
        (Some(host), Some(Protocol::Tcp(port)), None) => (host, port),
        _ => return Err(TransportError::NoDialableAddress),
    };

    let (name, want_v4, want_v6) = match host {
        Protocol::Ip4(_) | Protocol::Ip6(_) => return Ok(address.clone()),
        Protocol::Dns(name) => (name, true, true),
        Protocol::Dns4(name) => (name, true, false),
        Protocol::Dns6(name) => (name, false, true),
        _ => return Err(TransportError::NoDialableAddress),
    };

    let resolved = tokio::net::lookup_host((name.as_ref(), port))
        .await
        .map_err(|e| TransportError::ConnectionFailed(format!("resolving {}: {}", name, e)))?
        .find(|addr| (addr.is_ipv4() && want_v4) || (addr.is_ipv6() && want_v6))
        .ok_or_else(|| TransportError::ConnectionFailed(format!("{} has no address", name)))?;

    let mut dialable = Multiaddr::empty();
    dialable.push(match resolved.ip() {
        std::net::IpAddr::V4(ip) => Protocol::Ip4(ip),
        std::net::IpAddr::V6(ip) => Protocol::Ip6(ip),
    });
    dialable.push(Protocol::Tcp(port));
    Ok(dialable)
}

fn dial_failure(error: DialError) -> TransportError {
    match error {
        DialError::WrongPeerId { obtained, .. } => {
            TransportError::IdentityMismatch(obtained.to_string())
        }
        other => TransportError::ConnectionFailed(other.to_string()),
    }
}

/// Connector dialing over libp2p.
pub struct P2pConnector {
    keypair: Keypair,
    local: PeerIdentifier,
    dial_timeout: Duration,
}

impl P2pConnector {
    /// Connector with a fresh identity.
    pub fn ephemeral(dial_timeout: Duration) -> Result<Self, HealthError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_seed(signing_key.to_bytes(), dial_timeout)
    }

    /// Connector whose identity is derived from a hex-encoded ed25519 seed.
    pub fn from_seed_hex(seed_hex: &str, dial_timeout: Duration) -> Result<Self, HealthError> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| HealthError::Config(format!("node key is not hex: {}", e)))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            HealthError::Config(format!("node key must be 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_seed(seed, dial_timeout)
    }

    fn from_seed(seed: [u8; 32], dial_timeout: Duration) -> Result<Self, HealthError> {
        let keypair = Keypair::ed25519_from_bytes(seed)
            .map_err(|e| HealthError::Config(format!("node key rejected: {}", e)))?;
        let local = PeerIdentifier::new(keypair.public().to_peer_id());
        info!("[transport] Local node identity {}", local);
        Ok(Self {
            keypair,
            local,
            dial_timeout,
        })
    }

    /// Deadline of one dial, handshake included.
    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    async fn dial(
        &self,
        peer: &PeerIdentifier,
        address: Multiaddr,
    ) -> Result<(), TransportError> {
        let expected = *peer.peer_id();
        let mut swarm = build_swarm(self.keypair.clone())?;

        swarm
            .dial(
                DialOpts::peer_id(expected)
                    .addresses(vec![address])
                    .build(),
            )
            .map_err(dial_failure)?;

        loop {
            match swarm.select_next_some().await {
                SwarmEvent::ConnectionEstablished { peer_id, .. } if peer_id == expected => {
                    return Ok(());
                }
                SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                    return Err(TransportError::IdentityMismatch(peer_id.to_string()));
                }
                SwarmEvent::OutgoingConnectionError { error, .. } => {
                    return Err(dial_failure(error));
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl PeerConnector for P2pConnector {
    fn local_identifier(&self) -> PeerIdentifier {
        self.local
    }

    async fn connect(
        &self,
        peer: &PeerIdentifier,
        address: &Multiaddr,
    ) -> Result<(), TransportError> {
        let attempt = async {
            let dialable = resolve_dial_address(address).await?;
            debug!("[transport] Dialing {} at {}", peer, dialable);
            self.dial(peer, dialable).await
        };

        match tokio::time::timeout(self.dial_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Seeded keypair and its peer identifier.
    fn identity(byte: u8) -> (Keypair, PeerIdentifier) {
        let keypair = Keypair::ed25519_from_bytes([byte; 32]).unwrap();
        let peer = PeerIdentifier::new(keypair.public().to_peer_id());
        (keypair, peer)
    }

    /// Run a listening swarm in the background and return its address.
    async fn spawn_listener(keypair: Keypair) -> Multiaddr {
        let mut swarm = build_swarm(keypair).unwrap();
        swarm
            .listen_on("/ip4/127.0.0.1/tcp/0".parse().unwrap())
            .unwrap();

        let address = loop {
            if let SwarmEvent::NewListenAddr { address, .. } = swarm.select_next_some().await {
                break address;
            }
        };
        tokio::spawn(async move {
            loop {
                swarm.select_next_some().await;
            }
        });
        address
    }

    #[tokio::test]
    async fn test_resolve_passes_ip_through() {
        let ip: Multiaddr = "/ip4/10.0.0.1/tcp/55055".parse().unwrap();
        assert_eq!(resolve_dial_address(&ip).await.unwrap(), ip);
    }

    #[tokio::test]
    async fn test_resolve_dns_to_ip() {
        let dns: Multiaddr = "/dns4/localhost/tcp/55055".parse().unwrap();

        let resolved = resolve_dial_address(&dns).await.unwrap();

        let protocols: Vec<Protocol<'_>> = resolved.iter().collect();
        assert!(matches!(protocols[0], Protocol::Ip4(_)));
        assert_eq!(protocols[1], Protocol::Tcp(55055));
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_tcp() {
        let udp: Multiaddr = "/ip4/10.0.0.1/udp/55055".parse().unwrap();
        assert_eq!(
            resolve_dial_address(&udp).await,
            Err(TransportError::NoDialableAddress)
        );
    }

    #[test]
    fn test_seeded_identity_is_stable() {
        let seed = "11".repeat(32);
        let a = P2pConnector::from_seed_hex(&seed, Duration::from_secs(1)).unwrap();
        let b = P2pConnector::from_seed_hex(&seed, Duration::from_secs(1)).unwrap();
        assert_eq!(a.local_identifier(), b.local_identifier());
        assert_eq!(a.local_identifier(), identity(0x11).1);
    }

    #[test]
    fn test_bad_seed_is_config_error() {
        assert!(matches!(
            P2pConnector::from_seed_hex("zz", Duration::from_secs(1)),
            Err(HealthError::Config(_))
        ));
        assert!(matches!(
            P2pConnector::from_seed_hex("1111", Duration::from_secs(1)),
            Err(HealthError::Config(_))
        ));
    }

    #[test]
    fn test_ephemeral_identities_differ() {
        let a = P2pConnector::ephemeral(Duration::from_secs(1)).unwrap();
        let b = P2pConnector::ephemeral(Duration::from_secs(1)).unwrap();
        assert_ne!(a.local_identifier(), b.local_identifier());
    }

    #[tokio::test]
    async fn test_connect_to_claimed_peer() {
        let (keypair, peer) = identity(0x22);
        let address = spawn_listener(keypair).await;
        let connector = P2pConnector::ephemeral(Duration::from_secs(5)).unwrap();

        assert_eq!(connector.connect(&peer, &address).await, Ok(()));
    }

    #[tokio::test]
    async fn test_listener_with_other_identity_is_unreachable() {
        let (other, _) = identity(0x33);
        let (_, claimed) = identity(0x22);
        let address = spawn_listener(other).await;
        let connector = P2pConnector::ephemeral(Duration::from_secs(5)).unwrap();

        assert!(matches!(
            connector.connect(&claimed, &address).await,
            Err(TransportError::IdentityMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_plain_tcp_listener_is_unreachable() {
        // Accepts TCP but never answers the handshake.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let address: Multiaddr = format!("/ip4/127.0.0.1/tcp/{}", port).parse().unwrap();
        let (_, claimed) = identity(0x22);
        let connector = P2pConnector::ephemeral(Duration::from_millis(500)).unwrap();

        assert!(connector.connect(&claimed, &address).await.is_err());
        drop(listener);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let address: Multiaddr = format!("/ip4/127.0.0.1/tcp/{}", port).parse().unwrap();
        let connector = P2pConnector::ephemeral(Duration::from_secs(2)).unwrap();

        assert!(matches!(
            connector.connect(&identity(0x22).1, &address).await,
            Err(TransportError::ConnectionFailed(_))
        ));
    }
}
