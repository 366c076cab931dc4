//! # Report Assembly
//!
//! Read-only view over a finished reconciliation context, keyed by pillar
//! name in lexical order so two runs over the same inputs render the same
//! document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::context::ReconciliationContext;
use super::entities::{PillarInfo, RecordOrigin};
use super::identity::PeerIdentifier;

/// One pillar in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Registry data (or the synthetic stand-in).
    pub pillar_info: PillarInfo,
    /// Bridge participant.
    pub has_key_share: bool,
    /// Reachable during this run.
    pub is_online: bool,
    /// Known network addresses.
    pub network_addresses: BTreeSet<String>,
    /// Peer identifier, when resolved.
    pub network_identifier: Option<PeerIdentifier>,
    /// Where the record came from.
    pub origin: RecordOrigin,
}

impl ReportEntry {
    /// Designated signer that is currently unreachable.
    pub fn needs_attention(&self) -> bool {
        self.has_key_share && !self.is_online
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Records in the report.
    pub total: usize,
    /// Records holding a key share.
    pub key_share_holders: usize,
    /// Records reachable during the run.
    pub online: usize,
    /// Key-share holders that are not reachable.
    pub needs_attention: usize,
    /// Key-share holders unknown to the registry.
    pub unregistered: usize,
}

/// Pillar name → entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, ReportEntry>,
}

impl Report {
    /// Snapshot every record of the context.
    pub fn assemble(ctx: &ReconciliationContext) -> Self {
        let entries = ctx
            .records()
            .map(|record| {
                let entry = ReportEntry {
                    pillar_info: record.pillar_info().clone(),
                    has_key_share: record.has_key_share,
                    is_online: record.is_online(),
                    network_addresses: record.network_addresses().clone(),
                    network_identifier: record.network_identifier,
                    origin: record.origin(),
                };
                (record.name().to_string(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Only key-share holders that are not reachable.
    pub fn needs_attention(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.needs_attention())
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        Self { entries }
    }

    /// Entry by pillar name.
    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.get(name)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ReportEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Headline counts.
    pub fn summary(&self) -> ReportSummary {
        self.entries
            .values()
            .fold(ReportSummary::default(), |mut acc, entry| {
                acc.total += 1;
                acc.key_share_holders += usize::from(entry.has_key_share);
                acc.online += usize::from(entry.is_online);
                acc.needs_attention += usize::from(entry.needs_attention());
                acc.unregistered += usize::from(entry.origin == RecordOrigin::KeyShareOnly);
                acc
            })
    }

    /// Pretty JSON with tab indentation.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ParticipantRecord;
    use crate::domain::identity::Address;

    fn context() -> ReconciliationContext {
        let mut ctx = ReconciliationContext::new();
        let mut a = ParticipantRecord::new(
            PillarInfo::new("A", Address::from_bytes([0xAA; 20])),
            RecordOrigin::Registry,
        );
        a.has_key_share = true;
        let mut b = ParticipantRecord::new(
            PillarInfo::new("B", Address::from_bytes([0xBB; 20])),
            RecordOrigin::Registry,
        );
        b.has_key_share = true;
        b.mark_online();
        let c = ParticipantRecord::new(
            PillarInfo::new("C", Address::from_bytes([0xCC; 20])),
            RecordOrigin::Registry,
        );
        ctx.insert(c);
        ctx.insert(a);
        ctx.insert(b);
        ctx
    }

    #[test]
    fn test_assemble_contains_every_record_in_name_order() {
        let report = Report::assemble(&context());
        let names: Vec<&str> = report.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_needs_attention_view() {
        let report = Report::assemble(&context()).needs_attention();
        assert_eq!(report.len(), 1);
        assert!(report.get("A").is_some());
    }

    #[test]
    fn test_summary_counts() {
        let summary = Report::assemble(&context()).summary();
        assert_eq!(
            summary,
            ReportSummary {
                total: 3,
                key_share_holders: 2,
                online: 1,
                needs_attention: 1,
                unregistered: 0,
            }
        );
    }

    #[test]
    fn test_pretty_json_is_a_name_keyed_mapping() {
        let json = Report::assemble(&context()).to_pretty_json().unwrap();
        assert!(json.contains("\n\t\"A\": {"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let a = &value["A"];
        assert_eq!(a["hasKeyShare"], true);
        assert_eq!(a["isOnline"], false);
        assert_eq!(a["origin"], "registry");
        assert_eq!(a["pillarInfo"]["name"], "A");
        assert!(a["networkAddresses"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_empty_report_renders_empty_object() {
        let json = Report::default().to_pretty_json().unwrap();
        assert_eq!(json, "{}");
    }
}
