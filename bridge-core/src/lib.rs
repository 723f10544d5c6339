// bridge-core/src/lib.rs
// Terminal bridge: transport, connection handle, facades and conformance

pub mod breaker;
pub mod config;
pub mod conformance;
pub mod connection;
pub mod facade;
pub mod operations;
pub mod transport;

pub use breaker::{BreakerState, BreakerStatus};
pub use config::{BreakerSettings, Settings, TimeoutSettings};
pub use connection::ConnectionHandle;
pub use facade::{AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, BridgeControl, Terminal, TerminalApi};
pub use transport::Endpoint;

// Re-export the shared crate for convenience
pub use bridge_common;
