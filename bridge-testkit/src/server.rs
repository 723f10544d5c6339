//! WebSocket RPC server on the loopback interface, backed by a
//! [`FakeTerminal`]. Runs on its own thread and runtime so both facades
//! can talk to it from tests.

use crate::channel::SharedTerminal;
use crate::fake::FakeTerminal;
use bridge_common::errors::codes;
use bridge_core::config::Settings;
use bridge_core::transport::{Endpoint, RequestFrame, ResponseFrame};
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

pub struct LoopbackServer {
    addr: SocketAddr,
    terminal: SharedTerminal,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl LoopbackServer {
    /// Binds an ephemeral port on 127.0.0.1 and starts serving.
    pub fn start(terminal: FakeTerminal) -> io::Result<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let terminal = SharedTerminal::new(terminal);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown, stop) = oneshot::channel();

        let shared = terminal.clone();
        let thread = std::thread::Builder::new()
            .name("loopback-terminal".into())
            .spawn(move || {
                runtime.block_on(async move {
                    match TcpListener::from_std(listener) {
                        Ok(listener) => serve(listener, shared, stop).await,
                        Err(e) => warn!(error = %e, "loopback listener unusable"),
                    }
                });
            })?;

        info!(%addr, "loopback terminal listening");
        Ok(Self {
            addr,
            terminal,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn settings(&self) -> Settings {
        Settings::with_endpoint(self.endpoint())
    }

    pub fn terminal(&self) -> SharedTerminal {
        self.terminal.clone()
    }

    /// Stops accepting and closes every open connection.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for LoopbackServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(listener: TcpListener, terminal: SharedTerminal, mut stop: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut stop => {
                debug!("loopback terminal stopping");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(session(stream, peer, terminal.clone()));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
    }
}

async fn session(stream: TcpStream, peer: SocketAddr, terminal: SharedTerminal) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "handshake failed");
            return;
        }
    };
    debug!(%peer, "client attached");

    while let Some(message) = ws.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            // Pings are answered by the protocol layer.
            Ok(_) => continue,
        };
        let response = match serde_json::from_str::<RequestFrame>(&text) {
            Ok(frame) => terminal.handle(&frame),
            Err(e) => ResponseFrame::fault(0, codes::RES_E_INVALID_PARAMS, e.to_string()),
        };
        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "cannot encode response");
                break;
            }
        };
        if ws.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }
    debug!(%peer, "client detached");
}
