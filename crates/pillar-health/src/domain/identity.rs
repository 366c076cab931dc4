//! # Identity Codec
//!
//! Conversions between the three identities a pillar has:
//!
//! ```text
//! ed25519 public key ──SHA3-256──→ Address (z1…)
//!         ↑
//!         └── PeerIdentifier (12D3KooW…) embeds the key in an identity multihash
//! ```
//!
//! The derivation only goes one way: an address never yields a key, a key
//! always yields both an address and a peer identifier.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use libp2p_identity::PeerId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use super::errors::IdentityError;

/// Size of an ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a Zenon address.
pub const ADDRESS_SIZE: usize = 20;

/// Number of digest bytes kept in an address.
pub const ADDRESS_CORE_SIZE: usize = 19;

/// Leading byte of addresses derived from user keys.
pub const USER_ADDRESS_BYTE: u8 = 0x00;

/// Human-readable part of Zenon addresses.
pub const ADDRESS_HRP: Hrp = Hrp::parse_unchecked("z");

/// Length of the protobuf header preceding the key inside an identity
/// multihash digest: field 1 (key type), field 2 tag, key length.
pub const IDENTITY_KEY_HEADER_LEN: usize = 4;

const MULTIHASH_IDENTITY: u8 = 0x00;
const MULTIHASH_SHA2_256: u8 = 0x12;
const PROTOBUF_KEY_TYPE_TAG: u8 = 0x08;
const PROTOBUF_KEY_DATA_TAG: u8 = 0x12;
const KEY_TYPE_ED25519: u8 = 1;

// =============================================================================
// PublicKey
// =============================================================================

/// Raw ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let key: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            IdentityError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Decode a standard (padded) base64 key as found in `participant_keys`.
    pub fn from_base64(text: &str) -> Result<Self, IdentityError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Standard base64 form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

// =============================================================================
// Address
// =============================================================================

/// Zenon address: `0x00 || SHA3-256(public_key)[..19]`, rendered as bech32
/// with the `z` prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bech32::encode::<Bech32>(ADDRESS_HRP, &self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| IdentityError::InvalidAddress {
            input: s.to_string(),
            reason,
        };

        // Only the classic bech32 checksum is valid; bech32m is rejected.
        let checked =
            CheckedHrpstring::new::<Bech32>(s).map_err(|e| invalid(e.to_string()))?;
        if checked.hrp() != ADDRESS_HRP {
            return Err(invalid(format!("unexpected prefix {}", checked.hrp())));
        }
        let data: Vec<u8> = checked.byte_iter().collect();
        let bytes: [u8; ADDRESS_SIZE] = data
            .as_slice()
            .try_into()
            .map_err(|_| invalid(format!("expected {} bytes, got {}", ADDRESS_SIZE, data.len())))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// PeerIdentifier
// =============================================================================

/// libp2p peer identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerIdentifier(PeerId);

impl PeerIdentifier {
    /// Wrap a libp2p peer id.
    pub fn new(peer_id: PeerId) -> Self {
        Self(peer_id)
    }

    /// Underlying libp2p peer id.
    pub fn peer_id(&self) -> &PeerId {
        &self.0
    }
}

impl From<PeerId> for PeerIdentifier {
    fn from(peer_id: PeerId) -> Self {
        Self(peer_id)
    }
}

impl fmt::Display for PeerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for PeerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerIdentifier({})", self.0)
    }
}

impl FromStr for PeerIdentifier {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerId::from_str(s)
            .map(Self)
            .map_err(|e| IdentityError::IdentifierDecode(format!("{}: {}", s, e)))
    }
}

impl Serialize for PeerIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeerIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Derivations
// =============================================================================

/// Derive the on-chain address of a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let digest = Sha3_256::digest(public_key.as_bytes());
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes[0] = USER_ADDRESS_BYTE;
    bytes[1..].copy_from_slice(&digest[..ADDRESS_CORE_SIZE]);
    Address(bytes)
}

/// Derive the peer identifier of an ed25519 public key.
///
/// The protobuf-encoded key is 36 bytes, short enough to be inlined in an
/// identity multihash.
pub fn peer_identifier_from_public_key(
    public_key: &PublicKey,
) -> Result<PeerIdentifier, IdentityError> {
    let digest_len = (IDENTITY_KEY_HEADER_LEN + PUBLIC_KEY_SIZE) as u8;
    let mut bytes = Vec::with_capacity(2 + digest_len as usize);
    bytes.extend_from_slice(&[MULTIHASH_IDENTITY, digest_len]);
    bytes.extend_from_slice(&ed25519_key_header());
    bytes.extend_from_slice(public_key.as_bytes());

    PeerId::from_bytes(&bytes)
        .map(PeerIdentifier)
        .map_err(|e| IdentityError::IdentifierDecode(e.to_string()))
}

/// Recover the ed25519 public key embedded in a peer identifier.
pub fn public_key_from_peer_identifier(
    peer: &PeerIdentifier,
) -> Result<PublicKey, IdentityError> {
    let bytes = peer.0.to_bytes();
    let decode_err = |reason: &str| IdentityError::IdentifierDecode(format!("{}: {}", peer, reason));

    let (code, rest) = bytes
        .split_first()
        .ok_or_else(|| decode_err("empty multihash"))?;
    match *code {
        MULTIHASH_IDENTITY => {}
        MULTIHASH_SHA2_256 => {
            return Err(IdentityError::UnsupportedKeyType(format!(
                "{} is a hashed identifier (non-inlined key)",
                peer
            )))
        }
        other => return Err(decode_err(&format!("unexpected multihash code 0x{:02x}", other))),
    }

    let (len, digest) = rest
        .split_first()
        .ok_or_else(|| decode_err("missing multihash length"))?;
    if *len as usize != digest.len() {
        return Err(decode_err("multihash length mismatch"));
    }
    if digest.len() < IDENTITY_KEY_HEADER_LEN {
        return Err(decode_err("digest shorter than key header"));
    }

    let (header, key) = digest.split_at(IDENTITY_KEY_HEADER_LEN);
    if header[0] != PROTOBUF_KEY_TYPE_TAG || header[2] != PROTOBUF_KEY_DATA_TAG {
        return Err(decode_err("digest is not a protobuf public key"));
    }
    if header[1] != KEY_TYPE_ED25519 {
        return Err(IdentityError::UnsupportedKeyType(format!(
            "{} embeds a {} key",
            peer,
            key_type_name(header[1])
        )));
    }
    if header[3] as usize != PUBLIC_KEY_SIZE || key.len() != PUBLIC_KEY_SIZE {
        return Err(decode_err("ed25519 key length mismatch"));
    }

    PublicKey::from_slice(key)
}

/// Derive the on-chain address of the key embedded in a peer identifier.
pub fn address_from_peer_identifier(peer: &PeerIdentifier) -> Result<Address, IdentityError> {
    public_key_from_peer_identifier(peer).map(|key| derive_address(&key))
}

fn ed25519_key_header() -> [u8; IDENTITY_KEY_HEADER_LEN] {
    [
        PROTOBUF_KEY_TYPE_TAG,
        KEY_TYPE_ED25519,
        PROTOBUF_KEY_DATA_TAG,
        PUBLIC_KEY_SIZE as u8,
    ]
}

fn key_type_name(key_type: u8) -> &'static str {
    match key_type {
        0 => "RSA",
        1 => "Ed25519",
        2 => "Secp256k1",
        3 => "ECDSA",
        _ => "unknown",
    }
}
