//! In-process worker transport
//!
//! Hosts a debug adapter inside the bridge process on its own tokio task,
//! talking to it over message channels instead of byte pipes. Channel
//! messages are tagged so protocol payloads stay distinguishable from
//! lifecycle control signals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{Error, Result};

use super::{Transport, TransportEvent};

/// A message exchanged with a hosted adapter worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// An opaque protocol payload
    Data(String),
    /// A lifecycle control signal
    Control(ControlSignal),
}

/// Lifecycle control signals carried alongside protocol payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum ControlSignal {
    /// Host asks the worker to shut down
    Terminate,
    /// Worker announces that its adapter has finished
    Exited { code: i32 },
}

/// An adapter hosted on a bridge-owned task
///
/// `run` is the worker body: it consumes inbound messages from the session
/// and posts outbound messages (payloads, then optionally a final
/// `Exited` control) before returning.
#[async_trait]
pub trait AdapterWorker: Send + 'static {
    async fn run(
        self: Box<Self>,
        inbox: mpsc::UnboundedReceiver<WorkerMessage>,
        outbox: mpsc::UnboundedSender<WorkerMessage>,
    );
}

/// Transport over a message channel to a hosted worker task
pub struct WorkerTransport {
    to_worker: mpsc::UnboundedSender<WorkerMessage>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    worker: Option<JoinHandle<()>>,
    disposed: bool,
}

impl WorkerTransport {
    /// Spawn a worker and wire its channels up as a transport
    pub fn spawn<W: AdapterWorker>(worker: W) -> Self {
        let (to_worker, worker_inbox) = mpsc::unbounded_channel();
        let (worker_outbox, from_worker) = mpsc::unbounded_channel();

        let handle = tokio::spawn(Box::new(worker).run(worker_inbox, worker_outbox));

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(relay_worker_messages(from_worker, tx));

        Self {
            to_worker,
            events: Some(rx),
            worker: Some(handle),
            disposed: false,
        }
    }
}

/// Translate tagged worker messages into transport events
async fn relay_worker_messages(
    mut from_worker: mpsc::UnboundedReceiver<WorkerMessage>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(message) = from_worker.recv().await {
        match message {
            WorkerMessage::Data(payload) => {
                if events
                    .send(TransportEvent::Data(payload.into_bytes()))
                    .is_err()
                {
                    return;
                }
            }
            WorkerMessage::Control(ControlSignal::Exited { code }) => {
                let _ = events.send(TransportEvent::Closed {
                    exit_code: Some(code),
                });
                return;
            }
            WorkerMessage::Control(ControlSignal::Terminate) => {
                // Terminate flows host -> worker; a worker echoing it back
                // is treated as an ordinary shutdown.
                let _ = events.send(TransportEvent::Closed { exit_code: None });
                return;
            }
        }
    }

    // Worker finished without announcing an exit code.
    let _ = events.send(TransportEvent::Closed { exit_code: None });
}

#[async_trait]
impl Transport for WorkerTransport {
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let payload = String::from_utf8_lossy(bytes).into_owned();
        self.to_worker
            .send(WorkerMessage::Data(payload))
            .map_err(|_| Error::TransportClosed)
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        let _ = self
            .to_worker
            .send(WorkerMessage::Control(ControlSignal::Terminate));

        if let Some(worker) = self.worker.take() {
            worker.abort();
        }

        Ok(())
    }
}
