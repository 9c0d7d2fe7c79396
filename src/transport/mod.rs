//! Duplex byte-stream transports to debug adapters
//!
//! A transport hides how an adapter is reached (child process pipes, a
//! TCP/named-pipe connection, or an in-process worker task) behind one
//! interface: bytes out via [`Transport::send`], bytes and lifecycle
//! notifications in via the event channel.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::common::Result;

pub mod process;
pub mod socket;
pub mod worker;

pub use process::ProcessTransport;
pub use socket::SocketTransport;
pub use worker::{AdapterWorker, ControlSignal, WorkerMessage, WorkerTransport};

/// Notification delivered by a transport's reader task
#[derive(Debug)]
pub enum TransportEvent {
    /// Raw bytes from the peer, delivered in the order the peer wrote them
    Data(Vec<u8>),
    /// A transport-level error; does not by itself imply closure
    Error(String),
    /// The peer side is gone; fired exactly once per transport
    Closed { exit_code: Option<i32> },
}

/// A duplex byte channel to one debug adapter
#[async_trait]
pub trait Transport: Send {
    /// Take the event receiver (can only be taken once)
    ///
    /// Each transport runs a single reader task, so events arrive in
    /// delivery order and `Closed` is the final event.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>>;

    /// Write bytes to the peer
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release the transport and any resources it owns
    ///
    /// Idempotent, and safe to call after the peer has already closed.
    async fn dispose(&mut self) -> Result<()>;
}

/// Read a byte stream to EOF, forwarding chunks as transport events
///
/// Shared by the process and socket transports; the worker transport relays
/// tagged messages instead.
pub(crate) async fn pump_reader<R>(mut reader: R, events: mpsc::UnboundedSender<TransportEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                let _ = events.send(TransportEvent::Closed { exit_code: None });
                break;
            }
            Ok(n) => {
                if events.send(TransportEvent::Data(buf[..n].to_vec())).is_err() {
                    // receiver dropped, nobody cares anymore
                    break;
                }
            }
            Err(e) => {
                let _ = events.send(TransportEvent::Error(e.to_string()));
                let _ = events.send(TransportEvent::Closed { exit_code: None });
                break;
            }
        }
    }
}
