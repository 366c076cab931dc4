//! # Domain Module
//!
//! Identity codec, entities, reconciliation context and report.

pub mod address_book;
pub mod context;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod report;

pub use address_book::{classify_line, AddressBookEntry, LineKind, MIN_ENTRY_LEN};
pub use context::{InsertOutcome, ReconciliationContext};
pub use entities::{
    ParticipantRecord, PillarInfo, RecordOrigin, BOOTSTRAP_NAME, UNREGISTERED_PREFIX,
};
pub use errors::{HealthError, IdentityError, TransportError};
pub use identity::{
    address_from_peer_identifier, derive_address, peer_identifier_from_public_key,
    public_key_from_peer_identifier, Address, PeerIdentifier, PublicKey, IDENTITY_KEY_HEADER_LEN,
};
pub use report::{Report, ReportEntry, ReportSummary};
