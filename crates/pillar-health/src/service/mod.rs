//! # Reconciliation Service
//!
//! High-level service implementing the `NetworkHealthApi` port.
//!
//! Wires the pure overlays to the registry and connector ports and enforces
//! the phase order: snapshot, key shares, presence, report. No phase starts
//! before the previous one returned.

// Semantic submodules
mod api;
mod core;
mod presence;

// Re-export public API
pub use self::core::{ReconciliationService, ServiceConfig, MAX_PAGE_SIZE};
