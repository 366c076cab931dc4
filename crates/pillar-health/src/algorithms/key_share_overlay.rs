//! # Key-Share Overlay
//!
//! Marks the records of bridge participants listed in the local key-share
//! state. Each key is handled on its own, so the overlay is idempotent and
//! insensitive to the order of the key list.

use tracing::{debug, warn};

use crate::domain::{
    derive_address, peer_identifier_from_public_key, Address, HealthError, IdentityError,
    ParticipantRecord, PeerIdentifier, PillarInfo, PublicKey, ReconciliationContext, RecordOrigin,
};

/// Input name used for rejected participant keys.
pub const PARTICIPANT_KEYS_SOURCE: &str = "participant keys";

/// Counts of one overlay application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyShareSummary {
    /// Keys matched to an existing record.
    pub matched: usize,
    /// Keys whose address had no record; a `KeyShareOnly` record was created.
    pub unregistered: usize,
    /// Keys that could not be decoded.
    pub rejected: usize,
}

/// Identities derived from one participant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKey {
    /// On-chain address of the key.
    pub address: Address,
    /// Peer identifier of the key.
    pub peer: PeerIdentifier,
}

/// Decode a base64 participant key and derive both identities.
pub fn resolve_key(encoded: &str) -> Result<ResolvedKey, IdentityError> {
    let key = PublicKey::from_base64(encoded)?;
    Ok(ResolvedKey {
        address: derive_address(&key),
        peer: peer_identifier_from_public_key(&key)?,
    })
}

/// Per-entry error for a participant key that cannot be decoded.
pub fn malformed_key(encoded: &str, error: &IdentityError) -> HealthError {
    HealthError::MalformedInput {
        source_name: PARTICIPANT_KEYS_SOURCE.to_string(),
        reason: format!("{:?}: {}", encoded, error),
    }
}

/// Apply the participant keys to the context.
pub fn apply_key_shares<S: AsRef<str>>(
    ctx: &mut ReconciliationContext,
    participant_keys: &[S],
) -> KeyShareSummary {
    let mut summary = KeyShareSummary::default();

    for encoded in participant_keys {
        let encoded = encoded.as_ref();
        let resolved = match resolve_key(encoded) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("[key-share] Skipping entry: {}", malformed_key(encoded, &e));
                summary.rejected += 1;
                continue;
            }
        };

        match ctx.by_address_mut(&resolved.address) {
            Some(record) => {
                debug!(
                    "[key-share] {} holds a key share ({})",
                    record.name(),
                    resolved.address
                );
                record.has_key_share = true;
                record.network_identifier = Some(resolved.peer);
                summary.matched += 1;
            }
            None => {
                warn!(
                    "[key-share] Key-share holder {} is not a registered pillar",
                    resolved.address
                );
                let mut record = ParticipantRecord::new(
                    PillarInfo::unregistered(resolved.address),
                    RecordOrigin::KeyShareOnly,
                );
                record.has_key_share = true;
                record.network_identifier = Some(resolved.peer);
                ctx.insert(record);
                summary.unregistered += 1;
            }
        }
    }

    summary
}
