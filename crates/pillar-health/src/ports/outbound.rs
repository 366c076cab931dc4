//! # Outbound Ports
//!
//! What the reconciliation engine needs from the outside world: the on-chain
//! pillar registry and a P2P connector.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use multiaddr::Multiaddr;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::{HealthError, PeerIdentifier, PillarInfo, TransportError};

/// One page of `embedded.pillar.getAll`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarPage {
    /// Total number of pillars in the registry.
    pub count: u64,
    /// Pillars of this page.
    #[serde(default)]
    pub list: Vec<PillarInfo>,
}

/// On-chain pillar registry.
#[async_trait]
pub trait PillarRegistry: Send + Sync {
    /// Fetch one page of registered pillars.
    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PillarPage, HealthError>;
}

/// P2P transport used for reachability probes.
///
/// Implementations enforce their own dial timeouts; the service adds a
/// per-probe deadline on top.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Identity of the local node.
    fn local_identifier(&self) -> PeerIdentifier;

    /// Attempt a connection to `peer` at `address`.
    async fn connect(&self, peer: &PeerIdentifier, address: &Multiaddr)
        -> Result<(), TransportError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Registry serving a fixed pillar list.
#[derive(Debug, Clone, Default)]
pub struct MockPillarRegistry {
    /// Pillars to serve.
    pub pillars: Vec<PillarInfo>,
    /// Fail every call.
    pub should_fail: bool,
    /// Fail calls for pages at or beyond this index.
    pub fail_from_page: Option<u32>,
}

impl MockPillarRegistry {
    /// Serve the given pillars.
    pub fn with_pillars(pillars: Vec<PillarInfo>) -> Self {
        Self {
            pillars,
            ..Default::default()
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PillarRegistry for MockPillarRegistry {
    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PillarPage, HealthError> {
        let fails_here = self.fail_from_page.is_some_and(|from| page_index >= from);
        if self.should_fail || fails_here {
            return Err(HealthError::Retrieval("Mock failure".to_string()));
        }

        let start = page_index as usize * page_size as usize;
        let list = self
            .pillars
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(PillarPage {
            count: self.pillars.len() as u64,
            list,
        })
    }
}

/// Connector that succeeds only for configured peers and records attempts.
#[derive(Debug)]
pub struct MockConnector {
    local: PeerIdentifier,
    reachable: HashSet<PeerIdentifier>,
    hanging: HashSet<PeerIdentifier>,
    attempts: Mutex<Vec<PeerIdentifier>>,
}

impl MockConnector {
    /// Connector whose local node is `local`; every dial fails.
    pub fn new(local: PeerIdentifier) -> Self {
        Self {
            local,
            reachable: HashSet::new(),
            hanging: HashSet::new(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Dials to `peer` succeed.
    #[must_use]
    pub fn with_reachable(mut self, peer: PeerIdentifier) -> Self {
        self.reachable.insert(peer);
        self
    }

    /// Dials to `peer` never complete.
    #[must_use]
    pub fn with_hanging(mut self, peer: PeerIdentifier) -> Self {
        self.hanging.insert(peer);
        self
    }

    /// Peers dialed so far, in call order.
    pub fn attempts(&self) -> Vec<PeerIdentifier> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl PeerConnector for MockConnector {
    fn local_identifier(&self) -> PeerIdentifier {
        self.local
    }

    async fn connect(
        &self,
        peer: &PeerIdentifier,
        _address: &Multiaddr,
    ) -> Result<(), TransportError> {
        self.attempts.lock().push(*peer);

        if self.hanging.contains(peer) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.reachable.contains(peer) {
            Ok(())
        } else {
            Err(TransportError::ConnectionFailed("Mock refusal".to_string()))
        }
    }
}
