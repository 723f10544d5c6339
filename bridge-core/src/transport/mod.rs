// transport/mod.rs

pub mod endpoint;
pub mod errors;
pub mod recording;
pub mod traits;
pub mod wire;
pub mod ws;

pub use endpoint::Endpoint;
pub use errors::TransportError;
pub use recording::{FrameLog, RecordingDialer};
pub use traits::{Dialer, RpcChannel};
pub use wire::{RequestFrame, ResponseFrame, WireArg, WireCall, WireFault};
pub use ws::{WsChannel, WsDialer};
