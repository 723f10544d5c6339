//! In-memory transport to a [`FakeTerminal`].
//!
//! Frames still pass through JSON both ways so that encoding mistakes show
//! up exactly as they would on a socket. Faults can be switched on at any
//! time, also after the channel was dialed.

use crate::fake::FakeTerminal;
use async_trait::async_trait;
use bridge_core::transport::{
    Dialer, Endpoint, RequestFrame, ResponseFrame, RpcChannel, TransportError,
};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Terminal shared between a test and the channels talking to it.
#[derive(Clone, Default)]
pub struct SharedTerminal(Arc<Mutex<FakeTerminal>>);

impl SharedTerminal {
    pub fn new(terminal: FakeTerminal) -> Self {
        Self(Arc::new(Mutex::new(terminal)))
    }

    pub fn lock(&self) -> MutexGuard<'_, FakeTerminal> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn handle(&self, frame: &RequestFrame) -> ResponseFrame {
        self.lock().handle(frame)
    }
}

#[derive(Default)]
struct Faults {
    refuse: AtomicBool,
    drop_connection: AtomicBool,
    malformed: AtomicBool,
    delay_ms: AtomicU64,
    dials: AtomicUsize,
    /// `> method` when a request leaves, `< method` when its answer is back.
    exchanges: Mutex<Vec<String>>,
}

impl Faults {
    fn trace(&self, edge: char, method: &str) {
        self.exchanges
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("{} {}", edge, method));
    }
}

/// Dialer whose channels answer from a [`SharedTerminal`].
#[derive(Clone, Default)]
pub struct FakeDialer {
    terminal: SharedTerminal,
    faults: Arc<Faults>,
}

impl FakeDialer {
    pub fn new(terminal: FakeTerminal) -> Self {
        Self::with_shared(SharedTerminal::new(terminal))
    }

    pub fn with_shared(terminal: SharedTerminal) -> Self {
        Self {
            terminal,
            faults: Arc::default(),
        }
    }

    pub fn terminal(&self) -> SharedTerminal {
        self.terminal.clone()
    }

    /// Refuse new dials, as if nothing listened on the endpoint.
    pub fn refuse(&self, on: bool) {
        self.faults.refuse.store(on, Ordering::SeqCst);
    }

    /// Open channels fail every call as closed.
    pub fn drop_connection(&self, on: bool) {
        self.faults.drop_connection.store(on, Ordering::SeqCst);
    }

    /// Answers arrive as undecodable text.
    pub fn malformed(&self, on: bool) {
        self.faults.malformed.store(on, Ordering::SeqCst);
    }

    /// Every answer waits this long first.
    pub fn delay(&self, delay: Duration) {
        self.faults
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Request/answer edges in the order they happened on the wire.
    pub fn exchanges(&self) -> Vec<String> {
        self.faults
            .exchanges
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Successful and refused dials so far.
    pub fn dials(&self) -> usize {
        self.faults.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(
        &self,
        endpoint: &Endpoint,
        _timeout: Duration,
    ) -> Result<Box<dyn RpcChannel>, TransportError> {
        self.faults.dials.fetch_add(1, Ordering::SeqCst);
        if self.faults.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable(format!(
                "connection to {} refused",
                endpoint
            )));
        }
        Ok(Box::new(FakeChannel {
            terminal: self.terminal.clone(),
            faults: Arc::clone(&self.faults),
        }))
    }
}

struct FakeChannel {
    terminal: SharedTerminal,
    faults: Arc<Faults>,
}

impl FakeChannel {
    async fn stall(&self) {
        let delay = self.faults.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn check_open(&self) -> Result<(), TransportError> {
        if self.faults.drop_connection.load(Ordering::SeqCst) {
            return Err(TransportError::Closed("connection reset by peer".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RpcChannel for FakeChannel {
    async fn round_trip(&mut self, request: &RequestFrame) -> Result<ResponseFrame, TransportError> {
        self.check_open()?;
        self.faults.trace('>', &request.method);
        self.stall().await;
        self.check_open()?;

        let sent: RequestFrame = serde_json::from_str(&serde_json::to_string(request)?)?;
        debug!(method = %sent.method, id = sent.id, "fake terminal handling");
        let response = self.terminal.handle(&sent);
        self.faults.trace('<', &sent.method);

        if self.faults.malformed.load(Ordering::SeqCst) {
            return Err(TransportError::Malformed(format!(
                "unreadable answer to {}",
                sent.method
            )));
        }
        Ok(serde_json::from_str(&serde_json::to_string(&response)?)?)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.check_open()?;
        self.stall().await;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::transport::WireCall;

    #[tokio::test]
    async fn test_refused_dial_counts() {
        let dialer = FakeDialer::new(FakeTerminal::new());
        dialer.refuse(true);
        let outcome = dialer.dial(&Endpoint::default(), Duration::from_secs(1)).await;
        assert!(matches!(outcome, Err(TransportError::Unreachable(_))));
        assert_eq!(dialer.dials(), 1);
    }

    #[tokio::test]
    async fn test_dropped_connection_is_fatal() {
        let dialer = FakeDialer::new(FakeTerminal::new());
        let mut channel = dialer
            .dial(&Endpoint::default(), Duration::from_secs(1))
            .await
            .unwrap();
        dialer.drop_connection(true);
        let frame = WireCall::new("version").into_frame(1).unwrap();
        let err = channel.round_trip(&frame).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(channel.ping().await.is_err());
    }
}
