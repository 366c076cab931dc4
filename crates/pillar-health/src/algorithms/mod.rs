//! # Algorithms Module
//!
//! The two overlays, free of any I/O.

pub mod key_share_overlay;
pub mod presence_overlay;

pub use key_share_overlay::{
    apply_key_shares, malformed_key, resolve_key, KeyShareSummary, ResolvedKey,
    PARTICIPANT_KEYS_SOURCE,
};
pub use presence_overlay::{
    malformed_line, record_probe_outcome, resolve_presence, PresencePlan, PresenceSummary,
    ProbeTarget, ADDRESS_BOOK_SOURCE,
};
