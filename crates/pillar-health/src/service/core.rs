use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    address_from_peer_identifier, AddressBookEntry, HealthError, InsertOutcome,
    ParticipantRecord, PillarInfo, ReconciliationContext, RecordOrigin,
};
use crate::ports::{PeerConnector, PillarRegistry};

/// Largest page `embedded.pillar.getAll` serves.
pub const MAX_PAGE_SIZE: u32 = 1024;

/// Guard against a registry that keeps returning full pages.
const MAX_PAGES: u32 = 64;

/// Tunables of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Registry page size.
    pub page_size: u32,
    /// Deadline of a single connection attempt.
    pub probe_timeout: Duration,
    /// Connection attempts in flight at once; `1` probes sequentially.
    pub max_concurrent_probes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            page_size: 999,
            probe_timeout: Duration::from_secs(10),
            max_concurrent_probes: 16,
        }
    }
}

/// Reconciliation service.
///
/// # Example
///
/// ```rust,ignore
/// use pillar_health::ports::{NetworkHealthApi, RunInputs};
/// use pillar_health::service::{ReconciliationService, ServiceConfig};
///
/// let service = ReconciliationService::new(registry, connector, ServiceConfig::default());
/// let report = service.run(inputs).await?;
/// println!("{}", report.to_pretty_json()?);
/// ```
pub struct ReconciliationService {
    pub(crate) registry: Arc<dyn PillarRegistry>,
    pub(crate) connector: Arc<dyn PeerConnector>,
    pub(crate) config: ServiceConfig,
}

impl ReconciliationService {
    /// Create a new service over the given ports.
    pub fn new(
        registry: Arc<dyn PillarRegistry>,
        connector: Arc<dyn PeerConnector>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            registry,
            connector,
            config,
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Seed the context with the bootstrap node, then with every registry
    /// pillar that could be fetched.
    ///
    /// # Errors
    ///
    /// Only a bootstrap address that does not decode is an error; registry
    /// failures degrade to whatever was fetched.
    pub(crate) async fn snapshot(
        &self,
        bootstrap: &str,
    ) -> Result<ReconciliationContext, HealthError> {
        let entry: AddressBookEntry = bootstrap.parse()?;
        let address = address_from_peer_identifier(&entry.peer)?;

        let mut ctx = ReconciliationContext::new();
        let mut record =
            ParticipantRecord::new(PillarInfo::bootstrap(address), RecordOrigin::Bootstrap);
        record.network_identifier = Some(entry.peer);
        ctx.insert(record);
        debug!("[snapshot] Bootstrap {} resolves to {}", entry.peer, address);

        let (pillars, failure) = self.fetch_pillars().await;
        if let Some(e) = failure {
            warn!(
                "[snapshot] {}; continuing with {} pillar(s) fetched",
                e,
                pillars.len()
            );
        }

        for pillar in pillars {
            let name = pillar.name.clone();
            match ctx.insert(ParticipantRecord::new(pillar, RecordOrigin::Registry)) {
                InsertOutcome::Inserted => {}
                InsertOutcome::AddressReassigned { previous } => {
                    debug!("[snapshot] {} shares its address with {}", name, previous);
                }
                InsertOutcome::AddressShadowed { existing } => {
                    warn!(
                        "[snapshot] {} has the same producer address as {}; matches go to {}",
                        name, existing, existing
                    );
                }
                InsertOutcome::DuplicateName => {
                    warn!("[snapshot] Duplicate pillar name {}; keeping the first", name);
                }
            }
        }

        info!("[snapshot] {} record(s) after registry load", ctx.len());
        Ok(ctx)
    }

    /// Page through the registry. Returns what was collected and the error
    /// that stopped collection, if any.
    async fn fetch_pillars(&self) -> (Vec<PillarInfo>, Option<HealthError>) {
        let page_size = self.config.page_size.clamp(1, MAX_PAGE_SIZE);
        let mut pillars = Vec::new();

        for page_index in 0..MAX_PAGES {
            let page = match self.registry.get_all(page_index, page_size).await {
                Ok(page) => page,
                Err(e) => return (pillars, Some(e)),
            };

            let received = page.list.len();
            pillars.extend(page.list);
            debug!(
                "[snapshot] Registry page {}: {} pillar(s), {}/{} collected",
                page_index,
                received,
                pillars.len(),
                page.count
            );

            if received < page_size as usize || pillars.len() as u64 >= page.count {
                break;
            }
        }

        (pillars, None)
    }
}
