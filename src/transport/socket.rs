//! Socket transport for attach-mode adapters
//!
//! Connects to an already-running debug adapter server over TCP, or over a
//! local socket (Unix domain socket / Windows named pipe) via the
//! interprocess crate.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::common::{Error, Result};
use crate::model::DebugServerEndpoint;

use super::{pump_reader, Transport, TransportEvent};

/// Transport over a live connection to a debug adapter server
pub struct SocketTransport {
    writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    peer: String,
    disposed: bool,
}

impl std::fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketTransport")
            .field("writer", &self.writer.as_ref().map(|_| "<writer>"))
            .field("events", &self.events.as_ref().map(|_| "<events>"))
            .field("peer", &self.peer)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl SocketTransport {
    /// Connect to a debug server endpoint
    pub async fn connect(endpoint: &DebugServerEndpoint) -> Result<Self> {
        match endpoint {
            DebugServerEndpoint::Port(port) => Self::connect_tcp("127.0.0.1", *port).await,
            DebugServerEndpoint::Tcp { host, port } => Self::connect_tcp(host, *port).await,
            DebugServerEndpoint::Pipe { pipe } => Self::connect_pipe(pipe).await,
        }
    }

    async fn connect_tcp(host: &str, port: u16) -> Result<Self> {
        let peer = format!("{}:{}", host, port);
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::connect_failed(peer.clone(), e))?;
        let _ = stream.set_nodelay(true);

        tracing::debug!(peer = %peer, "Connected to debug server");

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump_reader(read_half, tx));

        Ok(Self {
            writer: Some(Box::new(write_half)),
            events: Some(rx),
            peer,
            disposed: false,
        })
    }

    async fn connect_pipe(pipe: &std::path::Path) -> Result<Self> {
        use interprocess::local_socket::tokio::{prelude::*, Stream as LocalStream};

        let peer = pipe.display().to_string();

        #[cfg(unix)]
        let stream = {
            use interprocess::local_socket::GenericFilePath;
            let name = pipe
                .to_fs_name::<GenericFilePath>()
                .map_err(|e| Error::connect_failed(peer.clone(), e))?;
            LocalStream::connect(name)
                .await
                .map_err(|e| Error::connect_failed(peer.clone(), e))?
        };

        #[cfg(windows)]
        let stream = {
            use interprocess::local_socket::GenericNamespaced;
            let name = peer
                .clone()
                .to_ns_name::<GenericNamespaced>()
                .map_err(|e| Error::connect_failed(peer.clone(), e))?;
            LocalStream::connect(name)
                .await
                .map_err(|e| Error::connect_failed(peer.clone(), e))?
        };

        tracing::debug!(peer = %peer, "Connected to debug server pipe");

        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump_reader(read_half, tx));

        Ok(Self {
            writer: Some(Box::new(write_half)),
            events: Some(rx),
            peer,
            disposed: false,
        })
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::TransportClosed)?;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(peer = %self.peer, error = %e, "Socket shutdown failed");
            }
        }

        Ok(())
    }
}
