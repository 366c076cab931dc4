//! # Presence Overlay
//!
//! Resolution half of the presence overlay: everything that can be decided
//! without touching the network. Lines are parsed, matched to records,
//! addresses merged and the local node marked online. What remains is a list
//! of probes for the service to dispatch; their outcomes come back through
//! [`record_probe_outcome`].

use std::fmt::Display;

use multiaddr::Multiaddr;
use tracing::{debug, warn};

use crate::domain::{
    address_from_peer_identifier, classify_line, AddressBookEntry, HealthError, LineKind,
    PeerIdentifier, ReconciliationContext,
};

/// Input name used for rejected address-book lines.
pub const ADDRESS_BOOK_SOURCE: &str = "address book";

/// Counts of one presence pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceSummary {
    /// Blank lines and comments.
    pub ignored: usize,
    /// Lines too short, unparseable, or with an undecodable identity.
    pub rejected: usize,
    /// Well-formed entries whose address is not a known pillar.
    pub unknown: usize,
    /// Entries naming the local node.
    pub self_matched: usize,
    /// Connection attempts issued.
    pub probed: usize,
    /// Connection attempts that succeeded.
    pub reachable: usize,
}

/// A connection attempt to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Record the outcome applies to.
    pub name: String,
    /// Identity to dial.
    pub peer: PeerIdentifier,
    /// Address to dial.
    pub transport: Multiaddr,
}

/// Output of the resolution step.
#[derive(Debug, Clone, Default)]
pub struct PresencePlan {
    /// Probes to dispatch, in address-book order.
    pub probes: Vec<ProbeTarget>,
    /// Counts so far (`probed` and `reachable` are filled by the service).
    pub summary: PresenceSummary,
}

/// Per-entry error for an address-book line (1-based) that was rejected.
pub fn malformed_line(line_no: usize, reason: impl Display) -> HealthError {
    HealthError::MalformedInput {
        source_name: ADDRESS_BOOK_SOURCE.to_string(),
        reason: format!("line {}: {}", line_no, reason),
    }
}

/// Resolve address-book lines against the context.
///
/// Mutates only records whose address is already known: addresses are
/// merged, a missing identifier is filled in and the local node is marked
/// online.
pub fn resolve_presence<S: AsRef<str>>(
    ctx: &mut ReconciliationContext,
    lines: &[S],
    local: &PeerIdentifier,
) -> PresencePlan {
    let mut plan = PresencePlan::default();

    for (line_no, line) in lines.iter().enumerate() {
        let candidate = match classify_line(line.as_ref()) {
            LineKind::Ignored => {
                plan.summary.ignored += 1;
                continue;
            }
            LineKind::TooShort(len) => {
                warn!(
                    "[presence] {}",
                    malformed_line(
                        line_no + 1,
                        format!("{} bytes is too short for an address entry", len)
                    )
                );
                plan.summary.rejected += 1;
                continue;
            }
            LineKind::Candidate(candidate) => candidate,
        };

        let entry: AddressBookEntry = match candidate.parse() {
            Ok(entry) => entry,
            Err(e) => {
                warn!("[presence] {}", malformed_line(line_no + 1, e));
                plan.summary.rejected += 1;
                continue;
            }
        };

        let address = match address_from_peer_identifier(&entry.peer) {
            Ok(address) => address,
            Err(e) => {
                warn!("[presence] {}", malformed_line(line_no + 1, e));
                plan.summary.rejected += 1;
                continue;
            }
        };

        let Some(record) = ctx.by_address_mut(&address) else {
            debug!(
                "[presence] Line {}: {} ({}) is not a known pillar",
                line_no + 1,
                entry.peer,
                address
            );
            plan.summary.unknown += 1;
            continue;
        };

        record.add_network_address(&entry.transport);
        record.set_identifier_if_absent(entry.peer);

        if entry.peer == *local {
            debug!("[presence] {} is the local node", record.name());
            record.mark_online();
            plan.summary.self_matched += 1;
            continue;
        }

        plan.probes.push(ProbeTarget {
            name: record.name().to_string(),
            peer: entry.peer,
            transport: entry.transport,
        });
    }

    plan
}

/// Apply the outcome of one probe. Failures leave the record untouched.
pub fn record_probe_outcome(ctx: &mut ReconciliationContext, name: &str, reachable: bool) {
    if !reachable {
        return;
    }
    if let Some(record) = ctx.get_mut(name) {
        record.mark_online();
    }
}
