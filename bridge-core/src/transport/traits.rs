// transport/traits.rs

use crate::transport::endpoint::Endpoint;
use crate::transport::errors::TransportError;
use crate::transport::wire::{RequestFrame, ResponseFrame};
use async_trait::async_trait;
use std::time::Duration;

/// One open request/response channel to the terminal.
#[async_trait]
pub trait RpcChannel: Send {
    /// Sends one request and waits for its matching response.
    async fn round_trip(&mut self, request: &RequestFrame) -> Result<ResponseFrame, TransportError>;

    /// Liveness probe that does not touch terminal state.
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Orderly close. Dropping the channel also releases it.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens channels. Facades own one dialer and use it on every `connect`.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<Box<dyn RpcChannel>, TransportError>;
}
