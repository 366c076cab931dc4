//! # Domain Entities
//!
//! Pillar registry entries and the per-pillar record the overlays mutate.

use std::collections::BTreeSet;

use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};

use super::identity::{Address, PeerIdentifier};

/// Name of the synthetic bootstrap record.
///
/// Zenon pillar names are alphanumeric runs joined by `-`, `_` or `.`, so a
/// leading `*` can never collide with a registered pillar.
pub const BOOTSTRAP_NAME: &str = "*Bootstrap";

/// Name prefix of key-share holders the registry does not know.
pub const UNREGISTERED_PREFIX: &str = "*Unregistered:";

/// Pillar as returned by `embedded.pillar.getAll`.
///
/// Only `name` and `producerAddress` take part in reconciliation, the other
/// fields are carried through to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarInfo {
    /// Unique pillar name.
    pub name: String,
    /// Momentum producing address, the cross-source matching key.
    #[serde(rename = "producerAddress")]
    pub block_producing_address: Address,
    /// Rank by weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
    /// Pillar type (legacy or regular).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub pillar_type: Option<u8>,
    /// Owner (stake) address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<Address>,
    /// Reward withdraw address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdraw_address: Option<Address>,
}

impl PillarInfo {
    /// Minimal pillar info with only the reconciliation fields.
    pub fn new(name: impl Into<String>, block_producing_address: Address) -> Self {
        Self {
            name: name.into(),
            block_producing_address,
            rank: None,
            pillar_type: None,
            owner_address: None,
            withdraw_address: None,
        }
    }

    /// Synthetic entry for the bootstrap node.
    pub fn bootstrap(address: Address) -> Self {
        Self::new(BOOTSTRAP_NAME, address)
    }

    /// Synthetic entry for a key-share holder absent from the registry.
    pub fn unregistered(address: Address) -> Self {
        Self::new(format!("{}{}", UNREGISTERED_PREFIX, address), address)
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordOrigin {
    /// The configured bootstrap node.
    Bootstrap,
    /// Returned by the on-chain registry.
    Registry,
    /// Listed in the key-share file but unknown to the registry.
    KeyShareOnly,
}

/// Reconciled facts about one pillar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pillar_info: PillarInfo,
    origin: RecordOrigin,
    /// Holds a share of the bridge signing key.
    pub has_key_share: bool,
    is_online: bool,
    network_addresses: BTreeSet<String>,
    /// Peer identifier, set by whichever overlay resolves it first.
    pub network_identifier: Option<PeerIdentifier>,
}

impl ParticipantRecord {
    /// Fresh record with all flags cleared.
    pub fn new(pillar_info: PillarInfo, origin: RecordOrigin) -> Self {
        Self {
            pillar_info,
            origin,
            has_key_share: false,
            is_online: false,
            network_addresses: BTreeSet::new(),
            network_identifier: None,
        }
    }

    /// Registry data. Immutable once the record exists.
    pub fn pillar_info(&self) -> &PillarInfo {
        &self.pillar_info
    }

    /// Pillar name (merge key).
    pub fn name(&self) -> &str {
        &self.pillar_info.name
    }

    /// Producer address (matching key).
    pub fn address(&self) -> Address {
        self.pillar_info.block_producing_address
    }

    /// Record origin.
    pub fn origin(&self) -> RecordOrigin {
        self.origin
    }

    /// Reachable during this run.
    pub fn is_online(&self) -> bool {
        self.is_online
    }

    /// Mark reachable. There is no way back to offline within a run.
    pub fn mark_online(&mut self) {
        self.is_online = true;
    }

    /// Known network addresses, ordered.
    pub fn network_addresses(&self) -> &BTreeSet<String> {
        &self.network_addresses
    }

    /// Add a network address. Returns `false` if it was already known.
    pub fn add_network_address(&mut self, address: &Multiaddr) -> bool {
        self.network_addresses.insert(address.to_string())
    }

    /// Set the peer identifier unless one is already known.
    pub fn set_identifier_if_absent(&mut self, peer: PeerIdentifier) {
        if self.network_identifier.is_none() {
            self.network_identifier = Some(peer);
        }
    }

    /// Designated signer that is not reachable.
    pub fn needs_attention(&self) -> bool {
        self.has_key_share && !self.is_online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_new_record_defaults() {
        let record = ParticipantRecord::new(PillarInfo::new("A", address(0xAA)), RecordOrigin::Registry);
        assert!(!record.has_key_share);
        assert!(!record.is_online());
        assert!(record.network_addresses().is_empty());
        assert!(record.network_identifier.is_none());
        assert!(!record.needs_attention());
    }

    #[test]
    fn test_needs_attention() {
        let mut record =
            ParticipantRecord::new(PillarInfo::new("A", address(0xAA)), RecordOrigin::Registry);
        record.has_key_share = true;
        assert!(record.needs_attention());
        record.mark_online();
        assert!(!record.needs_attention());
    }

    #[test]
    fn test_network_addresses_accumulate_without_duplicates() {
        let mut record =
            ParticipantRecord::new(PillarInfo::new("A", address(0xAA)), RecordOrigin::Registry);
        let first: Multiaddr = "/ip4/10.0.0.1/tcp/55055".parse().unwrap();
        let second: Multiaddr = "/dns/a.example/tcp/55055".parse().unwrap();
        assert!(record.add_network_address(&first));
        assert!(record.add_network_address(&second));
        assert!(!record.add_network_address(&first));
        assert_eq!(record.network_addresses().len(), 2);
    }

    #[test]
    fn test_synthetic_names_are_reserved() {
        assert_eq!(PillarInfo::bootstrap(address(1)).name, BOOTSTRAP_NAME);
        let info = PillarInfo::unregistered(address(0));
        assert_eq!(
            info.name,
            "*Unregistered:z1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqsggv2f"
        );
    }

    #[test]
    fn test_pillar_info_from_rpc_json() {
        let json = r#"{
            "name": "Anvil",
            "rank": 3,
            "type": 1,
            "ownerAddress": "z1qpxzr98usk4e29uvs3wdzvwhsnh4u5m9mwzchx",
            "producerAddress": "z1qr3f98uqlld255wyyl9lgt0kv7gp8lwmhfkxyg",
            "withdrawAddress": "z1qpxzr98usk4e29uvs3wdzvwhsnh4u5m9mwzchx",
            "isRevocable": false,
            "currentStats": {"producedMomentums": 10, "expectedMomentums": 10}
        }"#;
        let info: PillarInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "Anvil");
        assert_eq!(info.rank, Some(3));
        assert_eq!(
            info.block_producing_address.to_string(),
            "z1qr3f98uqlld255wyyl9lgt0kv7gp8lwmhfkxyg"
        );
    }
}
