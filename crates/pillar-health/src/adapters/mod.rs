//! # Adapters
//!
//! Concrete implementations of the outbound ports plus the input file readers.

pub mod files;
pub mod p2p_connector;
pub mod rpc_client;

pub use files::{load_local_state, read_address_book, LocalState};
pub use p2p_connector::{build_swarm, P2pConnector};
pub use rpc_client::{JsonRpcRegistryClient, GET_ALL_PILLARS};
