//! # Runtime Configuration
//!
//! Resolution order: built-in defaults, then the TOML file, then `PH_*`
//! environment variables, then command-line flags.
//!
//! ```toml
//! [rpc]
//! endpoint = "http://127.0.0.1:35997"
//! page_size = 999
//! timeout_secs = 10
//!
//! [inputs]
//! local_state = "localstate.json"
//! address_book = "address_book.seed"
//!
//! [network]
//! bootstrap = "/dns/bootstrap.zenon.community/tcp/55055/p2p/12D3KooW..."
//! probe_timeout_secs = 10
//! max_concurrent_probes = 16
//! # node_key = "<64 hex chars>"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pillar_health::domain::AddressBookEntry;
use pillar_health::service::MAX_PAGE_SIZE;
use pillar_health::{HealthError, ServiceConfig, DEFAULT_BOOTSTRAP};
use serde::Deserialize;

/// Environment variable overriding `rpc.endpoint`.
pub const ENV_RPC_ENDPOINT: &str = "PH_RPC_ENDPOINT";
/// Environment variable overriding `inputs.local_state`.
pub const ENV_LOCAL_STATE: &str = "PH_LOCAL_STATE";
/// Environment variable overriding `inputs.address_book`.
pub const ENV_ADDRESS_BOOK: &str = "PH_ADDRESS_BOOK";

/// Registry connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// HTTP JSON-RPC endpoint of a Zenon node.
    pub endpoint: String,
    /// Pillars requested per page.
    pub page_size: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:35997".to_string(),
            page_size: 999,
            timeout_secs: 10,
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Key-share state (mandatory).
    pub local_state: PathBuf,
    /// Address book (optional).
    pub address_book: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            local_state: PathBuf::from("localstate.json"),
            address_book: PathBuf::from("address_book.seed"),
        }
    }
}

/// P2P probing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bootstrap multiaddr.
    pub bootstrap: String,
    /// Deadline of one connection attempt.
    pub probe_timeout_secs: u64,
    /// Probes in flight at once.
    pub max_concurrent_probes: usize,
    /// Hex ed25519 seed of the local identity; ephemeral when absent.
    pub node_key: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bootstrap: DEFAULT_BOOTSTRAP.to_string(),
            probe_timeout_secs: 10,
            max_concurrent_probes: 16,
            node_key: None,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry connection.
    pub rpc: RpcConfig,
    /// Input files.
    pub inputs: InputsConfig,
    /// P2P probing.
    pub network: NetworkConfig,
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--rpc`
    pub rpc_endpoint: Option<String>,
    /// `--local-state`
    pub local_state: Option<PathBuf>,
    /// `--address-book`
    pub address_book: Option<PathBuf>,
    /// `--bootstrap`
    pub bootstrap: Option<String>,
    /// `--probe-timeout`
    pub probe_timeout_secs: Option<u64>,
    /// `--node-key`
    pub node_key: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `HealthError::Config` if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HealthError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            HealthError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn parse(content: &str) -> Result<Self, HealthError> {
        toml::from_str(content).map_err(|e| HealthError::Config(e.to_string()))
    }

    /// Apply `PH_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply `PH_*` variables from `lookup`. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(endpoint) = get(ENV_RPC_ENDPOINT) {
            self.rpc.endpoint = endpoint;
        }
        if let Some(path) = get(ENV_LOCAL_STATE) {
            self.inputs.local_state = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_ADDRESS_BOOK) {
            self.inputs.address_book = PathBuf::from(path);
        }
    }

    /// Apply command-line values.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(endpoint) = overrides.rpc_endpoint {
            self.rpc.endpoint = endpoint;
        }
        if let Some(path) = overrides.local_state {
            self.inputs.local_state = path;
        }
        if let Some(path) = overrides.address_book {
            self.inputs.address_book = path;
        }
        if let Some(bootstrap) = overrides.bootstrap {
            self.network.bootstrap = bootstrap;
        }
        if let Some(secs) = overrides.probe_timeout_secs {
            self.network.probe_timeout_secs = secs;
        }
        if overrides.node_key.is_some() {
            self.network.node_key = overrides.node_key;
        }
    }

    /// Check value ranges and the bootstrap address.
    pub fn validate(&self) -> Result<(), HealthError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.rpc.page_size) {
            return Err(HealthError::Config(format!(
                "rpc.page_size must be in 1..={}, got {}",
                MAX_PAGE_SIZE, self.rpc.page_size
            )));
        }
        if self.rpc.timeout_secs == 0 {
            return Err(HealthError::Config("rpc.timeout_secs must be > 0".to_string()));
        }
        if self.network.probe_timeout_secs == 0 {
            return Err(HealthError::Config(
                "network.probe_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.network.max_concurrent_probes == 0 {
            return Err(HealthError::Config(
                "network.max_concurrent_probes must be > 0".to_string(),
            ));
        }
        self.network
            .bootstrap
            .parse::<AddressBookEntry>()
            .map_err(|e| HealthError::Config(format!("network.bootstrap: {}", e)))?;
        Ok(())
    }

    /// Registry request timeout.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }

    /// Service tunables.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            page_size: self.rpc.page_size,
            probe_timeout: Duration::from_secs(self.network.probe_timeout_secs),
            max_concurrent_probes: self.network.max_concurrent_probes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc.page_size, 999);
        assert_eq!(config.network.max_concurrent_probes, 16);
        assert_eq!(config.service_config(), ServiceConfig::default());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [rpc]
            endpoint = "http://node:35997"

            [network]
            probe_timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc.endpoint, "http://node:35997");
        assert_eq!(config.rpc.page_size, 999);
        assert_eq!(config.network.probe_timeout_secs, 3);
        assert_eq!(config.inputs, InputsConfig::default());
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(matches!(
            Config::parse("[rpc\nendpoint ="),
            Err(HealthError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[inputs]\nlocal_state = \"/var/lib/bridge/localstate.json\"").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(
            config.inputs.local_state,
            PathBuf::from("/var/lib/bridge/localstate.json")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("pillar-health.toml")),
            Err(HealthError::Config(_))
        ));
    }

    #[test]
    fn test_precedence_env_then_cli() {
        let mut config = Config::parse("[rpc]\nendpoint = \"http://file:1\"").unwrap();

        let env: HashMap<&str, &str> = [
            (ENV_RPC_ENDPOINT, "http://env:2"),
            (ENV_ADDRESS_BOOK, "env.seed"),
            (ENV_LOCAL_STATE, "  "),
        ]
        .into_iter()
        .collect();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.rpc.endpoint, "http://env:2");
        assert_eq!(config.inputs.address_book, PathBuf::from("env.seed"));
        assert_eq!(config.inputs.local_state, PathBuf::from("localstate.json"));

        config.apply_overrides(Overrides {
            rpc_endpoint: Some("http://cli:3".to_string()),
            probe_timeout_secs: Some(2),
            ..Default::default()
        });

        assert_eq!(config.rpc.endpoint, "http://cli:3");
        assert_eq!(config.inputs.address_book, PathBuf::from("env.seed"));
        assert_eq!(config.network.probe_timeout_secs, 2);
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.rpc.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rpc.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.probe_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.max_concurrent_probes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bootstrap() {
        let mut config = Config::default();
        config.network.bootstrap = "/dns/bootstrap.zenon.community/tcp/55055".to_string();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("network.bootstrap"));
    }
}
