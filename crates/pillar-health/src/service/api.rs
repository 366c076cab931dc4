use async_trait::async_trait;
use tracing::info;

use super::core::ReconciliationService;
use crate::algorithms::{apply_key_shares, KeyShareSummary, PresenceSummary};
use crate::domain::{HealthError, ReconciliationContext, Report};
use crate::ports::{NetworkHealthApi, RunInputs};

#[async_trait]
impl NetworkHealthApi for ReconciliationService {
    async fn build_snapshot(&self, bootstrap: &str) -> Result<ReconciliationContext, HealthError> {
        self.snapshot(bootstrap).await
    }

    fn apply_key_shares(
        &self,
        ctx: &mut ReconciliationContext,
        participant_keys: &[String],
    ) -> KeyShareSummary {
        let summary = apply_key_shares(ctx, participant_keys);
        info!(
            "[key-share] {} matched, {} unregistered, {} rejected",
            summary.matched, summary.unregistered, summary.rejected
        );
        summary
    }

    async fn apply_presence(
        &self,
        ctx: &mut ReconciliationContext,
        lines: &[String],
    ) -> PresenceSummary {
        self.presence(ctx, lines).await
    }

    async fn run(&self, inputs: RunInputs) -> Result<Report, HealthError> {
        let mut ctx = self.build_snapshot(&inputs.bootstrap).await?;

        self.apply_key_shares(&mut ctx, &inputs.participant_keys);

        let mut lines = Vec::with_capacity(inputs.address_book.len() + 1);
        lines.push(inputs.bootstrap);
        lines.extend(inputs.address_book);
        self.apply_presence(&mut ctx, &lines).await;

        let report = Report::assemble(&ctx);
        let summary = report.summary();
        info!(
            "[report] {} participant(s): {} key-share holder(s), {} online, {} need attention",
            summary.total, summary.key_share_holders, summary.online, summary.needs_attention
        );
        Ok(report)
    }
}
