// bridge-core/src/facade/mod.rs

pub mod blocking;
pub mod suspending;
pub mod traits;

pub use blocking::Terminal;
pub use suspending::AsyncTerminal;
pub use traits::{AsyncBridgeControl, AsyncTerminalApi, BridgeControl, TerminalApi};
