//! # Pillar Health
//!
//! Prints which Zenon pillars hold a bridge key share and whether they are
//! reachable on the P2P network. The report goes to stdout as JSON; logs go
//! to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use health_runtime::{logging, render, run, Config, OutputView, Overrides};

/// Pillar network-health report
#[derive(Parser, Debug)]
#[command(name = "pillar-health")]
#[command(about = "Report key-share holders and their P2P reachability")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zenon node JSON-RPC endpoint
    #[arg(long)]
    rpc: Option<String>,

    /// Key-share state file
    #[arg(long)]
    local_state: Option<PathBuf>,

    /// Address-book file
    #[arg(long)]
    address_book: Option<PathBuf>,

    /// Bootstrap multiaddr (must end with /p2p/<peer id>)
    #[arg(long)]
    bootstrap: Option<String>,

    /// Per-probe timeout in seconds
    #[arg(long)]
    probe_timeout: Option<u64>,

    /// Hex ed25519 seed for the local node identity
    #[arg(long)]
    node_key: Option<String>,

    /// Print only key-share holders that are not reachable
    #[arg(long)]
    needs_attention: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            rpc_endpoint: self.rpc.clone(),
            local_state: self.local_state.clone(),
            address_book: self.address_book.clone(),
            bootstrap: self.bootstrap.clone(),
            probe_timeout_secs: self.probe_timeout,
            node_key: self.node_key.clone(),
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();
    config.apply_overrides(args.overrides());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    let config = load_config(&args)?;
    let report = run(&config).await?;

    let view = if args.needs_attention {
        OutputView::NeedsAttention
    } else {
        OutputView::Full
    };
    println!("{}", render(&report, view)?);

    Ok(())
}
