use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use super::core::ReconciliationService;
use crate::algorithms::{record_probe_outcome, resolve_presence, PresenceSummary, ProbeTarget};
use crate::domain::{HealthError, ReconciliationContext, TransportError};

impl ReconciliationService {
    /// Resolve address-book lines, dial every probe target and fold the
    /// outcomes back into the context.
    pub(crate) async fn presence(
        &self,
        ctx: &mut ReconciliationContext,
        lines: &[String],
    ) -> PresenceSummary {
        let local = self.connector.local_identifier();
        let plan = resolve_presence(ctx, lines, &local);
        let mut summary = plan.summary;

        let outcomes = self.dispatch_probes(plan.probes).await;

        // Outcomes are applied after every probe finished, so the order in
        // which they complete does not matter.
        for (target, result) in &outcomes {
            summary.probed += 1;
            match result {
                Ok(()) => {
                    debug!("[presence] {} reachable at {}", target.name, target.transport);
                    summary.reachable += 1;
                    record_probe_outcome(ctx, &target.name, true);
                }
                Err(e) => {
                    debug!(
                        "[presence] {} unreachable at {}: {}",
                        target.name, target.transport, e
                    );
                    record_probe_outcome(ctx, &target.name, false);
                }
            }
        }

        info!(
            "[presence] {} probed, {} reachable, {} unknown, {} rejected",
            summary.probed, summary.reachable, summary.unknown, summary.rejected
        );
        summary
    }

    /// Dial every target with bounded concurrency. A dial that outlives the
    /// configured deadline counts as a timeout.
    pub(crate) async fn dispatch_probes(
        &self,
        probes: Vec<ProbeTarget>,
    ) -> Vec<(ProbeTarget, Result<(), HealthError>)> {
        let timeout = self.config.probe_timeout;
        let limit = self.config.max_concurrent_probes.max(1);
        let connector = &self.connector;

        stream::iter(probes)
            .map(|target| async move {
                let result = match tokio::time::timeout(
                    timeout,
                    connector.connect(&target.peer, &target.transport),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                };
                (target, result.map_err(HealthError::Transport))
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }
}
