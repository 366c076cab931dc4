//! # Address Book Entries
//!
//! An address-book line is a multiaddr ending in `/p2p/<peer id>`, e.g.
//! `/ip4/1.2.3.4/tcp/55055/p2p/12D3KooW…`. The transport part is what a
//! connector dials; the peer part is the claimed identity.

use std::str::FromStr;

use multiaddr::{Multiaddr, Protocol};

use super::errors::IdentityError;
use super::identity::PeerIdentifier;

/// Lines shorter than this cannot hold a routable address plus an ed25519
/// peer id (52 characters alone) and are rejected before parsing.
pub const MIN_ENTRY_LEN: usize = 64;

/// How a raw address-book line should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty line or comment, skipped silently.
    Ignored,
    /// Below `MIN_ENTRY_LEN`, skipped with a diagnostic.
    TooShort(usize),
    /// Worth parsing.
    Candidate(&'a str),
}

/// Classify a raw line. Leading and trailing whitespace is ignored.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return LineKind::Ignored;
    }
    if trimmed.len() < MIN_ENTRY_LEN {
        return LineKind::TooShort(trimmed.len());
    }
    LineKind::Candidate(trimmed)
}

/// A parsed address-book line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBookEntry {
    /// Routable part, without the trailing `/p2p/` component.
    pub transport: Multiaddr,
    /// Claimed peer identity.
    pub peer: PeerIdentifier,
}

impl FromStr for AddressBookEntry {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let address = Multiaddr::from_str(s).map_err(|e| IdentityError::AddressParse {
            input: truncate(s),
            reason: e.to_string(),
        })?;

        let mut protocols: Vec<Protocol<'_>> = address.iter().collect();
        let peer = match protocols.pop() {
            Some(Protocol::P2p(peer_id)) => PeerIdentifier::new(peer_id),
            _ => {
                return Err(IdentityError::IdentifierDecode(format!(
                    "{} does not end with /p2p/<peer id>",
                    truncate(s)
                )))
            }
        };

        let mut transport = Multiaddr::empty();
        for protocol in protocols {
            transport.push(protocol);
        }

        Ok(Self { transport, peer })
    }
}

fn truncate(s: &str) -> String {
    const MAX: usize = 96;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAP: &str =
        "/dns/bootstrap.zenon.community/tcp/55055/p2p/12D3KooWBVQYaz3yuJor8oW7bUqoAGDZDpFBGbGerL3SprHn57pQ";

    #[test]
    fn test_classify_blank_and_comment() {
        assert_eq!(classify_line(""), LineKind::Ignored);
        assert_eq!(classify_line("   "), LineKind::Ignored);
        assert_eq!(classify_line("# seed nodes"), LineKind::Ignored);
        assert_eq!(classify_line("// seed nodes"), LineKind::Ignored);
    }

    #[test]
    fn test_classify_short_line() {
        assert_eq!(classify_line("/ip4/1.2.3"), LineKind::TooShort(10));
    }

    #[test]
    fn test_classify_candidate_is_trimmed() {
        let line = format!("  {}\r", BOOTSTRAP);
        assert_eq!(classify_line(&line), LineKind::Candidate(BOOTSTRAP));
    }

    #[test]
    fn test_parse_bootstrap_entry() {
        let entry: AddressBookEntry = BOOTSTRAP.parse().unwrap();
        assert_eq!(
            entry.transport.to_string(),
            "/dns/bootstrap.zenon.community/tcp/55055"
        );
        assert_eq!(
            entry.peer.to_string(),
            "12D3KooWBVQYaz3yuJor8oW7bUqoAGDZDpFBGbGerL3SprHn57pQ"
        );
    }

    #[test]
    fn test_parse_ip4_entry() {
        let entry: AddressBookEntry =
            "/ip4/10.0.0.1/tcp/55055/p2p/12D3KooWAxzCBFVtEyKLnRm43gHxigCoe2d4UmkRTXhBNSv5bcCx"
                .parse()
                .unwrap();
        assert_eq!(entry.transport.to_string(), "/ip4/10.0.0.1/tcp/55055");
    }

    #[test]
    fn test_parse_rejects_non_multiaddr() {
        let err = "this line is long enough but it is certainly not a multiaddr at all"
            .parse::<AddressBookEntry>()
            .unwrap_err();
        assert!(matches!(err, IdentityError::AddressParse { .. }));
    }

    #[test]
    fn test_parse_requires_trailing_peer() {
        let err = "/dns/bootstrap.zenon.community/tcp/55055"
            .parse::<AddressBookEntry>()
            .unwrap_err();
        assert!(matches!(err, IdentityError::IdentifierDecode(_)));
    }
}
