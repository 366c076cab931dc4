//! # Pillar Health
//!
//! Network-health reconciliation for Zenon pillars.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Answer one question for the operators of the bridge: which pillars hold a
//! share of the bridge signing key, and which of those are reachable on the
//! P2P network right now. Three sources of truth are joined:
//! - the on-chain pillar registry (name → producer address)
//! - the local key-share state (ed25519 participant keys)
//! - the P2P address book (multiaddrs ending in `/p2p/<peer id>`)
//!
//! Producer addresses and peer identifiers are both derived from the same
//! ed25519 key, which is what makes the join possible.
//!
//! ## Phases
//!
//! | Phase | Input | Effect |
//! |-------|-------|--------|
//! | Snapshot | bootstrap + registry | one record per pillar |
//! | Key shares | participant keys | `has_key_share`, identifiers, unregistered holders |
//! | Presence | address book | addresses, identifiers, `is_online` |
//! | Report | context | name-ordered JSON document |
//!
//! ## Module Structure
//!
//! ```text
//! pillar-health/
//! ├── domain/          # Identity codec, records, context, report, errors
//! ├── algorithms/      # Key-share and presence overlays
//! ├── ports/           # NetworkHealthApi, PillarRegistry, PeerConnector
//! ├── adapters/        # JSON-RPC registry, libp2p connector, input files
//! └── service/         # ReconciliationService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    load_local_state, read_address_book, JsonRpcRegistryClient, LocalState, P2pConnector,
};
pub use algorithms::{apply_key_shares, resolve_presence, KeyShareSummary, PresenceSummary};
pub use domain::{
    address_from_peer_identifier, derive_address, peer_identifier_from_public_key,
    public_key_from_peer_identifier, Address, HealthError, IdentityError, ParticipantRecord, PeerIdentifier, PillarInfo, PublicKey,
    ReconciliationContext, RecordOrigin, Report, ReportEntry, ReportSummary, TransportError,
    BOOTSTRAP_NAME, UNREGISTERED_PREFIX,
};
pub use ports::{
    MockConnector, MockPillarRegistry, NetworkHealthApi, PeerConnector, PillarPage,
    PillarRegistry, RunInputs,
};
pub use service::{ReconciliationService, ServiceConfig};

/// Bootstrap node of the Zenon network.
pub const DEFAULT_BOOTSTRAP: &str =
    "/dns/bootstrap.zenon.community/tcp/55055/p2p/12D3KooWBVQYaz3yuJor8oW7bUqoAGDZDpFBGbGerL3SprHn57pQ";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }

    #[test]
    fn test_default_bootstrap_parses() {
        let entry: super::domain::AddressBookEntry = super::DEFAULT_BOOTSTRAP.parse().unwrap();
        assert_eq!(
            super::address_from_peer_identifier(&entry.peer)
                .unwrap()
                .to_string(),
            "z1qpxzr98usk4e29uvs3wdzvwhsnh4u5m9mwzchx"
        );
    }
}
