//! # Inbound Ports
//!
//! What the engine offers to a host binary.

use async_trait::async_trait;

use crate::algorithms::{KeyShareSummary, PresenceSummary};
use crate::domain::{HealthError, ReconciliationContext, Report};

/// Inputs of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    /// Bootstrap multiaddr, always probed first.
    pub bootstrap: String,
    /// Base64 participant keys from the key-share state.
    pub participant_keys: Vec<String>,
    /// Address-book lines, without the bootstrap.
    pub address_book: Vec<String>,
}

/// Network health reconciliation API.
#[async_trait]
pub trait NetworkHealthApi: Send + Sync {
    /// Seed a context with the bootstrap node and the registry pillars.
    async fn build_snapshot(&self, bootstrap: &str) -> Result<ReconciliationContext, HealthError>;

    /// Mark key-share holders.
    fn apply_key_shares(
        &self,
        ctx: &mut ReconciliationContext,
        participant_keys: &[String],
    ) -> KeyShareSummary;

    /// Merge address-book entries and probe reachability.
    async fn apply_presence(
        &self,
        ctx: &mut ReconciliationContext,
        lines: &[String],
    ) -> PresenceSummary;

    /// All phases in order, then the report.
    async fn run(&self, inputs: RunInputs) -> Result<Report, HealthError>;
}
