//! JSON-RPC client for the Zenon node's embedded pillar contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::HealthError;
use crate::ports::{PillarPage, PillarRegistry};

/// Registry query method.
pub const GET_ALL_PILLARS: &str = "embedded.pillar.getAll";

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: String,
    params: T,
    id: u64,
}

impl<T> JsonRpcRequest<T> {
    fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}

/// Pillar registry backed by a node's HTTP JSON-RPC endpoint.
pub struct JsonRpcRegistryClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl JsonRpcRegistryClient {
    /// Create a client for `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, HealthError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| HealthError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, HealthError> {
        let request = JsonRpcRequest::new(method, params, self.next_id());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    HealthError::Retrieval(format!("Cannot connect to {}", self.endpoint))
                } else {
                    HealthError::Retrieval(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| HealthError::Retrieval(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(HealthError::Retrieval(error.to_string()));
        }

        rpc_response
            .result
            .ok_or_else(|| HealthError::Retrieval("Missing result in response".to_string()))
    }
}

#[async_trait]
impl PillarRegistry for JsonRpcRegistryClient {
    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PillarPage, HealthError> {
        debug!(
            "[rpc] {} page {} size {} at {}",
            GET_ALL_PILLARS, page_index, page_size, self.endpoint
        );
        self.call(GET_ALL_PILLARS, (page_index, page_size)).await
    }
}
