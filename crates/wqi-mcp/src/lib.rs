//! JSON-RPC tool server over the WQI engine, reachable on stdio or HTTP.

pub mod config;
pub mod metrics;
pub mod protocol;
mod server;
mod transport;

pub use config::{ServerConfig, Transport};
pub use server::WqiServer;
