//! # Reconciliation Context
//!
//! The one mutable structure of a run: records keyed by pillar name plus an
//! index from producer address to name. Every record is indexed under both
//! keys at insertion, so an address lookup that succeeds always resolves to
//! an existing record.

use std::collections::{BTreeMap, HashMap};

use super::entities::{ParticipantRecord, RecordOrigin};
use super::identity::Address;

/// Result of inserting a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New name, new address.
    Inserted,
    /// New name whose address now resolves to it instead of a synthetic
    /// bootstrap record.
    AddressReassigned {
        /// Name the address used to resolve to.
        previous: String,
    },
    /// New name, but its address keeps resolving to an earlier record.
    AddressShadowed {
        /// Name the address resolves to.
        existing: String,
    },
    /// Name already present; nothing changed.
    DuplicateName,
}

/// Name-indexed and address-indexed participant records.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationContext {
    records: BTreeMap<String, ParticipantRecord>,
    by_address: HashMap<Address, String>,
}

impl ReconciliationContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its name and address.
    pub fn insert(&mut self, record: ParticipantRecord) -> InsertOutcome {
        let name = record.name().to_string();
        if self.records.contains_key(&name) {
            return InsertOutcome::DuplicateName;
        }

        let address = record.address();
        let origin = record.origin();
        let outcome = match self.by_address.get(&address) {
            None => {
                self.by_address.insert(address, name.clone());
                InsertOutcome::Inserted
            }
            Some(existing) => {
                let existing_is_bootstrap = self
                    .records
                    .get(existing)
                    .is_some_and(|r| r.origin() == RecordOrigin::Bootstrap);
                if existing_is_bootstrap && origin == RecordOrigin::Registry {
                    let previous = existing.clone();
                    self.by_address.insert(address, name.clone());
                    InsertOutcome::AddressReassigned { previous }
                } else {
                    InsertOutcome::AddressShadowed {
                        existing: existing.clone(),
                    }
                }
            }
        };

        self.records.insert(name, record);
        outcome
    }

    /// Record by pillar name.
    pub fn get(&self, name: &str) -> Option<&ParticipantRecord> {
        self.records.get(name)
    }

    /// Mutable record by pillar name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParticipantRecord> {
        self.records.get_mut(name)
    }

    /// Name the address resolves to.
    pub fn name_for(&self, address: &Address) -> Option<&str> {
        self.by_address.get(address).map(String::as_str)
    }

    /// Record the address resolves to.
    pub fn by_address(&self, address: &Address) -> Option<&ParticipantRecord> {
        self.by_address
            .get(address)
            .and_then(|name| self.records.get(name))
    }

    /// Mutable record the address resolves to.
    pub fn by_address_mut(&mut self, address: &Address) -> Option<&mut ParticipantRecord> {
        let name = self.by_address.get(address)?;
        self.records.get_mut(name)
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
