// bridge-core/src/connection.rs
// ====================================================================
// Connection handle: one logical session to the terminal
// ====================================================================
//
// Unconnected --open(ok)--> Connected --close--> Unconnected
// Connected --open--> Connected
// Connected --transport lost / timeout--> Unconnected
//
// Connection and terminal failures never raise: the call yields a null
// result and the cause is kept for `last_error`. After repeated transport
// failures the breaker refuses dials and calls until its recovery window
// passed.

use crate::breaker::{BreakerStatus, CircuitBreaker};
use crate::config::{BreakerSettings, TimeoutSettings};
use crate::transport::endpoint::Endpoint;
use crate::transport::traits::{Dialer, RpcChannel};
use crate::transport::wire::WireCall;
use bridge_common::errors::{BridgeError, BridgeResult, TerminalError};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ConnectionHandle {
    endpoint: Endpoint,
    dialer: Arc<dyn Dialer>,
    channel: Option<Box<dyn RpcChannel>>,
    /// Readable without holding the handle.
    liveness: Arc<AtomicBool>,
    pending_error: Option<TerminalError>,
    /// Symbols with an active market-depth subscription.
    books: HashSet<String>,
    next_id: u64,
    timeouts: TimeoutSettings,
    breaker: CircuitBreaker,
}

impl ConnectionHandle {
    pub fn new(endpoint: Endpoint, dialer: Arc<dyn Dialer>, timeouts: TimeoutSettings) -> Self {
        Self {
            endpoint,
            dialer,
            channel: None,
            liveness: Arc::new(AtomicBool::new(false)),
            pending_error: None,
            books: HashSet::new(),
            next_id: 0,
            timeouts,
            breaker: CircuitBreaker::new(&BreakerSettings::default()),
        }
    }

    pub fn with_breaker(mut self, settings: &BreakerSettings) -> Self {
        self.breaker = CircuitBreaker::new(settings);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn timeouts(&self) -> &TimeoutSettings {
        &self.timeouts
    }

    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.liveness)
    }

    pub fn is_connected(&self) -> bool {
        self.liveness.load(Ordering::SeqCst)
    }

    // ====================================================================
    // LIFECYCLE
    // ====================================================================

    /// Opens the channel. `Ok(false)` when the terminal cannot be reached,
    /// `Err` only when the endpoint itself is unusable.
    pub async fn open(&mut self) -> BridgeResult<bool> {
        if self.channel.is_some() {
            return Ok(true);
        }
        self.endpoint.validate()?;
        if !self.breaker.allows() {
            debug!(endpoint = %self.endpoint, "dial refused by open breaker");
            self.record(self.breaker.rejection());
            return Ok(false);
        }

        match self.dialer.dial(&self.endpoint, self.timeouts.connect()).await {
            Ok(channel) => {
                self.channel = Some(channel);
                self.liveness.store(true, Ordering::SeqCst);
                self.pending_error = None;
                self.breaker.record_success();
                info!(endpoint = %self.endpoint, "bridge connected");
                Ok(true)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "bridge connect failed");
                self.breaker.record_failure();
                self.record(TerminalError::new(
                    TerminalError::not_connected().code,
                    format!("Connect to {} failed: {}", self.endpoint, e),
                ));
                Ok(false)
            }
        }
    }

    /// Idempotent. The channel is released even if the close handshake fails.
    pub async fn close(&mut self) {
        self.books.clear();
        let Some(mut channel) = self.channel.take() else {
            self.liveness.store(false, Ordering::SeqCst);
            return;
        };
        self.liveness.store(false, Ordering::SeqCst);
        match tokio::time::timeout(self.timeouts.health(), channel.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "close handshake failed"),
            Err(_) => debug!("close handshake timed out"),
        }
        info!(endpoint = %self.endpoint, "bridge disconnected");
    }

    /// Releases the channel without a close handshake.
    pub fn abandon(&mut self) {
        self.books.clear();
        self.liveness.store(false, Ordering::SeqCst);
        if self.channel.take().is_some() {
            info!(endpoint = %self.endpoint, "bridge channel released");
        }
    }

    /// Bounded liveness probe. A failed probe is a lost transport.
    pub async fn probe(&mut self) -> bool {
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };
        let outcome = tokio::time::timeout(self.timeouts.health(), channel.ping()).await;
        match outcome {
            Ok(Ok(())) => {
                self.breaker.record_success();
                true
            }
            Ok(Err(e)) => {
                self.lose_transport(&e.to_string());
                false
            }
            Err(_) => {
                self.lose_transport("health probe timed out");
                false
            }
        }
    }

    fn lose_transport(&mut self, detail: &str) {
        warn!(endpoint = %self.endpoint, detail, "transport lost");
        self.channel = None;
        self.books.clear();
        self.liveness.store(false, Ordering::SeqCst);
        self.breaker.record_failure();
        self.record(TerminalError::transport_lost(detail));
    }

    // ====================================================================
    // CALLS
    // ====================================================================

    /// One serialized round trip. `Ok(Value::Null)` means absent.
    pub async fn call(&mut self, call: WireCall) -> BridgeResult<Value> {
        let operation = call.method();
        if !self.breaker.allows() {
            debug!(operation, "call refused by open breaker");
            self.record(self.breaker.rejection());
            return Ok(Value::Null);
        }
        let Some(channel) = self.channel.as_mut() else {
            debug!(operation, "call on unconnected handle");
            self.record(TerminalError::not_connected());
            return Ok(Value::Null);
        };

        self.next_id += 1;
        let frame = call.into_frame(self.next_id)?;
        let deadline = self.timeouts.for_operation(operation);
        debug!(operation, id = frame.id, "-> terminal");

        let outcome = tokio::time::timeout(deadline, channel.round_trip(&frame)).await;
        match outcome {
            Err(_) => {
                warn!(operation, ?deadline, "call timed out, dropping transport");
                self.lose_transport("call timed out");
                self.record(TerminalError::timeout(operation));
                Err(BridgeError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms: deadline.as_millis() as u64,
                })
            }
            Ok(Err(e)) if !e.is_fatal() => {
                Err(BridgeError::Serialization(format!("{}: {}", operation, e)))
            }
            Ok(Err(e)) => {
                self.lose_transport(&e.to_string());
                Ok(Value::Null)
            }
            Ok(Ok(response)) => {
                self.breaker.record_success();
                if let Some(fault) = response.error {
                    debug!(operation, code = fault.code, "terminal rejected call");
                    self.record(TerminalError::new(fault.code, fault.message));
                    return Ok(Value::Null);
                }
                self.pending_error = None;
                debug!(operation, id = response.id, "<- terminal");
                Ok(response.result)
            }
        }
    }

    // ====================================================================
    // ERROR STATE & SUBSCRIPTIONS
    // ====================================================================

    pub fn record(&mut self, error: TerminalError) {
        self.pending_error = Some(error);
    }

    /// Error produced locally since the last successful round trip.
    pub fn pending_error(&self) -> Option<&TerminalError> {
        self.pending_error.as_ref()
    }

    pub fn breaker_status(&self) -> BreakerStatus {
        self.breaker.status()
    }

    pub fn reset_breaker(&mut self) {
        self.breaker.reset();
    }

    pub fn subscribe(&mut self, symbol: &str) {
        self.books.insert(symbol.to_string());
    }

    pub fn unsubscribe(&mut self, symbol: &str) -> bool {
        self.books.remove(symbol)
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.books.contains(symbol)
    }

    pub fn clear_books(&mut self) {
        self.books.clear();
    }
}
