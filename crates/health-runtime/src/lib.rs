//! # Pillar Health Runtime
//!
//! Process-level concerns of the `pillar-health` executable.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, TOML file, environment, flags)
//! 2. Validate it
//! 3. Load the key-share state (fatal when unusable)
//! 4. Read the address book (empty when missing)
//! 5. Wire the JSON-RPC registry and the libp2p connector into the service
//! 6. Run, render the report

pub mod config;
pub mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use pillar_health::{
    load_local_state, read_address_book, JsonRpcRegistryClient, NetworkHealthApi,
    P2pConnector, ReconciliationService, Report, RunInputs,
};

pub use config::{Config, Overrides};

/// Which view of the report to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputView {
    /// Every record.
    #[default]
    Full,
    /// Key-share holders that are not reachable.
    NeedsAttention,
}

/// Build the service from configuration.
pub fn build_service(config: &Config) -> Result<ReconciliationService> {
    let service_config = config.service_config();

    let registry = JsonRpcRegistryClient::new(&config.rpc.endpoint, config.rpc_timeout())
        .context("Failed to create registry client")?;

    let connector = match &config.network.node_key {
        Some(seed) => P2pConnector::from_seed_hex(seed, service_config.probe_timeout),
        None => P2pConnector::ephemeral(service_config.probe_timeout),
    }
    .context("Failed to create local node identity")?;

    Ok(ReconciliationService::new(
        Arc::new(registry),
        Arc::new(connector),
        service_config,
    ))
}

/// Load inputs, run the reconciliation and return the report.
///
/// The key-share state is read before the registry is contacted, so an
/// unusable state file fails the run without any network traffic.
pub async fn run(config: &Config) -> Result<Report> {
    config.validate().context("Invalid configuration")?;

    let local_state =
        load_local_state(&config.inputs.local_state).context("Failed to load key-share state")?;
    let address_book = read_address_book(&config.inputs.address_book);

    let service = build_service(config)?;
    info!(
        "[health] Querying {} (page size {})",
        config.rpc.endpoint, config.rpc.page_size
    );

    let report = service
        .run(RunInputs {
            bootstrap: config.network.bootstrap.clone(),
            participant_keys: local_state.participant_keys,
            address_book,
        })
        .await
        .context("Reconciliation failed")?;

    Ok(report)
}

/// Render the selected view as tab-indented JSON.
pub fn render(report: &Report, view: OutputView) -> Result<String> {
    let json = match view {
        OutputView::Full => report.to_pretty_json(),
        OutputView::NeedsAttention => report.needs_attention().to_pretty_json(),
    }
    .context("Failed to serialize report")?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillar_health::{derive_address, PillarInfo, PublicKey};
    use pillar_health::{ParticipantRecord, ReconciliationContext, RecordOrigin};

    fn report() -> Report {
        let mut ctx = ReconciliationContext::new();
        for (name, byte, share) in [("A", 0x11u8, true), ("B", 0x22u8, false)] {
            let mut record = ParticipantRecord::new(
                PillarInfo::new(name, derive_address(&PublicKey::new([byte; 32]))),
                RecordOrigin::Registry,
            );
            record.has_key_share = share;
            ctx.insert(record);
        }
        Report::assemble(&ctx)
    }

    #[test]
    fn test_render_views() {
        let report = report();

        let full = render(&report, OutputView::Full).unwrap();
        assert!(full.contains("\"A\"") && full.contains("\"B\""));

        let attention = render(&report, OutputView::NeedsAttention).unwrap();
        assert!(attention.contains("\"A\""));
        assert!(!attention.contains("\"B\""));
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.inputs.local_state = dir.path().join("localstate.json");
        // Nothing listens here; the run must fail before contacting it.
        config.rpc.endpoint = "http://127.0.0.1:9".to_string();

        let err = run(&config).await.unwrap_err();

        assert!(format!("{:#}", err).contains("localstate.json"));
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_config() {
        let mut config = Config::default();
        config.network.max_concurrent_probes = 0;

        let err = run(&config).await.unwrap_err();

        assert!(format!("{:#}", err).contains("max_concurrent_probes"));
    }

    #[test]
    fn test_build_service_with_node_key() {
        let mut config = Config::default();
        config.network.node_key = Some("22".repeat(32));
        assert!(build_service(&config).is_ok());

        config.network.node_key = Some("not-hex".to_string());
        assert!(build_service(&config).is_err());
    }
}
