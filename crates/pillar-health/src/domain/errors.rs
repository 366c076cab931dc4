//! # Domain Errors
//!
//! Error types for identity decoding and for a reconciliation run.
//!
//! Identity errors are always per entry: the offending key or address-book
//! line is dropped and the run continues. Run-level errors are either
//! recoverable (`Retrieval`, `MalformedInput`, `Transport`) or fatal
//! (`MandatoryFile`, `Config`).

use thiserror::Error;

/// Errors produced by the identity codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Network address text is not a valid multiaddr.
    #[error("Malformed network address {input:?}: {reason}")]
    AddressParse {
        /// Offending input (possibly truncated).
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Peer identifier could not be decoded into an embedded public key.
    #[error("Cannot decode peer identifier: {0}")]
    IdentifierDecode(String),

    /// Peer identifier embeds a key of a type other than ed25519.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Public key text is not a base64 encoded 32-byte ed25519 key.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Blockchain address text is not a valid `z1…` address.
    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// Offending input.
        input: String,
        /// Decoder message.
        reason: String,
    },
}

/// Errors raised by a reconciliation run.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The pillar registry could not be queried.
    #[error("Registry retrieval failed: {0}")]
    Retrieval(String),

    /// A single input entry could not be parsed.
    #[error("Malformed input in {source_name}: {reason}")]
    MalformedInput {
        /// Which input the entry came from.
        source_name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The key-share state file is missing or unreadable.
    #[error("Mandatory file {path} unusable: {reason}")]
    MandatoryFile {
        /// Path of the file.
        path: String,
        /// I/O or parse message.
        reason: String,
    },

    /// A connection attempt failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Identity derivation failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Errors returned by a peer connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The dial did not complete within the probe deadline.
    #[error("Connection attempt timed out")]
    Timeout,

    /// None of the peer's addresses can be dialed by this transport.
    #[error("No dialable address")]
    NoDialableAddress,

    /// Every dial attempt failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote completed the handshake under a different identity.
    #[error("Remote identified as {0}")]
    IdentityMismatch(String),
}
