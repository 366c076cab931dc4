//! # Ports Module
//!
//! Hexagonal architecture ports (inbound API, outbound dependencies).

pub mod inbound;
pub mod outbound;

pub use inbound::{NetworkHealthApi, RunInputs};
pub use outbound::{MockConnector, MockPillarRegistry, PeerConnector, PillarPage, PillarRegistry};
