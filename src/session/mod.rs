//! Debug adapter sessions
//!
//! A session binds one frame decoder to one transport, turning the duplex
//! byte channel into a duplex message channel. Inbound bytes are unframed
//! and routed to the session's client sink; outbound messages are framed
//! and written to the transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::protocol::{self, codec::FrameDecoder, messages};
use crate::transport::{Transport, TransportEvent};

/// Where the client reaches per-session channels: `<path>/<session-id>`
pub const DEBUG_ADAPTER_PATH: &str = "/services/debug-adapter";

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Routing messages between client and adapter
    Active,
    /// Torn down; late frames are dropped
    Disposed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Destination for messages flowing from the adapter to the client
///
/// Concrete session kinds differ only in where decoded messages go: the
/// default sink feeds the per-session channel, a custom factory may forward
/// to a socket, a worker, or anything else.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: String);
}

/// Default sink: an unbounded channel drained by the session's consumer
pub struct ChannelSink(mpsc::UnboundedSender<String>);

impl MessageSink for ChannelSink {
    fn send(&self, message: String) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.0.send(message);
    }
}

/// One live, framed, bidirectional connection to one debug adapter
pub struct DebugAdapterSession {
    id: String,
    transport: tokio::sync::Mutex<Box<dyn Transport>>,
    sink: Arc<dyn MessageSink>,
    disposed: Arc<AtomicBool>,
    outbound: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    pump: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl DebugAdapterSession {
    /// Create a session with the default channel sink and payload limit
    pub fn new(id: impl Into<String>, transport: Box<dyn Transport>) -> Arc<Self> {
        Self::with_limit(id, transport, protocol::DEFAULT_MAX_PAYLOAD_BYTES)
    }

    /// Create a session with the default channel sink and an explicit limit
    pub fn with_limit(
        id: impl Into<String>,
        transport: Box<dyn Transport>,
        max_payload_bytes: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self::with_sink(id, transport, Arc::new(ChannelSink(tx)), max_payload_bytes);
        *session.outbound.lock() = Some(rx);
        session
    }

    /// Create a session routing adapter messages into a custom sink
    pub fn with_sink(
        id: impl Into<String>,
        mut transport: Box<dyn Transport>,
        sink: Arc<dyn MessageSink>,
        max_payload_bytes: usize,
    ) -> Arc<Self> {
        let id = id.into();
        let events = transport.take_events();
        let disposed = Arc::new(AtomicBool::new(false));

        let session = Arc::new(Self {
            id: id.clone(),
            transport: tokio::sync::Mutex::new(transport),
            sink: sink.clone(),
            disposed: disposed.clone(),
            outbound: parking_lot::Mutex::new(None),
            pump: parking_lot::Mutex::new(None),
        });

        if let Some(events) = events {
            let handle = tokio::spawn(pump(
                id,
                events,
                FrameDecoder::with_limit(max_payload_bytes),
                sink,
                disposed,
            ));
            *session.pump.lock() = Some(handle);
        }

        session
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.disposed.load(Ordering::SeqCst) {
            SessionState::Disposed
        } else {
            SessionState::Active
        }
    }

    /// Take the outbound message receiver (once; only for channel-sink sessions)
    pub fn take_outbound(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.outbound.lock().take()
    }

    /// Frame a message and write it to the adapter
    ///
    /// Transport failures are reported to the client as in-band error
    /// events rather than returned; a disposed session drops the message.
    pub async fn write(&self, message: &str) {
        if self.disposed.load(Ordering::SeqCst) {
            tracing::debug!(session_id = %self.id, "Dropping write to disposed session");
            return;
        }

        let frame = protocol::encode_frame(message);
        let mut transport = self.transport.lock().await;
        if let Err(e) = transport.send(&frame).await {
            tracing::warn!(session_id = %self.id, error = %e, "Failed to write to adapter");
            self.sink.send(messages::error_event(&e.to_string()));
        }
    }

    /// Tear the session down
    ///
    /// One-shot: the first call sends best-effort disconnect/terminate
    /// requests to the adapter and releases the transport; later calls are
    /// no-ops. Safe to race against in-flight transport events.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!(session_id = %self.id, "Disposing debug adapter session");

        let mut transport = self.transport.lock().await;

        // Fire-and-forget shutdown handshake; the adapter may already be gone.
        let _ = transport
            .send(&protocol::encode_frame(&messages::disconnect_request()))
            .await;
        let _ = transport
            .send(&protocol::encode_frame(&messages::terminate_request()))
            .await;

        if let Err(e) = transport.dispose().await {
            tracing::debug!(session_id = %self.id, error = %e, "Transport disposal failed");
        }
        drop(transport);

        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
    }
}

/// Route transport events through the decoder into the client sink
async fn pump(
    session_id: String,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    mut decoder: FrameDecoder,
    sink: Arc<dyn MessageSink>,
    disposed: Arc<AtomicBool>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Data(bytes) => {
                if disposed.load(Ordering::SeqCst) {
                    // late-arriving frames after disposal are dropped
                    continue;
                }
                match decoder.feed(&bytes) {
                    Ok(payloads) => {
                        for payload in payloads {
                            sink.send(payload);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(session_id = %session_id, error = %e, "Frame decode failed");
                        sink.send(messages::error_event(&e.to_string()));
                    }
                }
            }
            TransportEvent::Error(reason) => {
                tracing::warn!(session_id = %session_id, error = %reason, "Adapter transport error");
                if !disposed.load(Ordering::SeqCst) {
                    sink.send(messages::error_event(&reason));
                }
            }
            TransportEvent::Closed { exit_code } => {
                if !disposed.load(Ordering::SeqCst) {
                    let code = exit_code.unwrap_or(1);
                    tracing::info!(session_id = %session_id, exit_code = code, "Debug adapter exited");
                    sink.send(messages::exited_event(code));
                }
                break;
            }
        }
    }
}

/// Per-session bidirectional message channel handed to the client layer
pub struct SessionChannel {
    session_id: String,
    session: Weak<DebugAdapterSession>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl SessionChannel {
    /// Open the bidirectional channel of a session (once per session)
    ///
    /// The channel holds the session weakly, so it keeps draining queued
    /// messages even after the manager has dropped the session itself.
    pub fn open(session: &Arc<DebugAdapterSession>) -> Option<Self> {
        let outbound = session.take_outbound()?;
        Some(Self {
            session_id: session.id.clone(),
            session: Arc::downgrade(session),
            outbound,
        })
    }

    /// Id of the session this channel belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Path under which this channel is published
    pub fn path(&self) -> String {
        format!("{}/{}", DEBUG_ADAPTER_PATH, self.session_id)
    }

    /// Send a client message to the adapter
    ///
    /// Dropped silently once the session is gone, like any other write to a
    /// disposed session.
    pub async fn send(&self, message: &str) {
        if let Some(session) = self.session.upgrade() {
            session.write(message).await;
        }
    }

    /// Receive the next adapter-to-client message
    ///
    /// Returns `None` after the session has been dropped and every queued
    /// message has been drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }
}

/// Produces sessions for a debug type
///
/// The manager uses its own default factory unless a contribution supplies
/// one for the debug type being started.
pub trait DebugAdapterSessionFactory: Send + Sync {
    fn create(&self, session_id: &str, transport: Box<dyn Transport>) -> Arc<DebugAdapterSession>;
}

/// Factory for plain channel-sink sessions
pub struct DefaultSessionFactory {
    /// Payload size cap handed to each session's decoder
    pub max_payload_bytes: usize,
}

impl Default for DefaultSessionFactory {
    fn default() -> Self {
        Self {
            max_payload_bytes: protocol::DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl DebugAdapterSessionFactory for DefaultSessionFactory {
    fn create(&self, session_id: &str, transport: Box<dyn Transport>) -> Arc<DebugAdapterSession> {
        DebugAdapterSession::with_limit(session_id, transport, self.max_payload_bytes)
    }
}
