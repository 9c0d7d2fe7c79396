//! Debug adapter session manager
//!
//! Creates sessions (id generation, registry lookup, transport
//! acquisition), indexes them by id, and routes control operations to the
//! right session. Sessions run independently; the index is the only shared
//! structure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::common::config::{Config, Timeouts};
use crate::common::{Error, Result};
use crate::model::DebugConfiguration;
use crate::registry::DebugAdapterContributionRegistry;
use crate::session::{
    DebugAdapterSession, DebugAdapterSessionFactory, DefaultSessionFactory, SessionChannel,
};
use crate::transport::{ProcessTransport, SocketTransport, Transport};

/// Manager of live debug adapter sessions
pub struct DebugAdapterSessionManager {
    sessions: parking_lot::Mutex<HashMap<String, Arc<DebugAdapterSession>>>,
    registry: Arc<DebugAdapterContributionRegistry>,
    default_factory: Arc<dyn DebugAdapterSessionFactory>,
    timeouts: Timeouts,
}

impl DebugAdapterSessionManager {
    /// Create a manager over a populated contribution registry
    pub fn new(registry: Arc<DebugAdapterContributionRegistry>, config: &Config) -> Self {
        Self {
            sessions: parking_lot::Mutex::new(HashMap::new()),
            registry,
            default_factory: Arc::new(DefaultSessionFactory {
                max_payload_bytes: config.limits.max_message_bytes(),
            }),
            timeouts: config.timeouts,
        }
    }

    /// Create a new debug adapter session and return its id
    ///
    /// The transport comes from the configuration's `debugServer` endpoint
    /// when present, otherwise from the registry (a ready transport, or an
    /// executable descriptor to spawn). Failures propagate to the caller
    /// and leave the session index untouched.
    #[tracing::instrument(skip(self, config), fields(debug_type = %config.debug_type))]
    pub async fn create(&self, config: &DebugConfiguration) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();

        let transport: Box<dyn Transport> = if let Some(endpoint) = &config.debug_server {
            let connect = SocketTransport::connect(endpoint);
            let secs = self.timeouts.connect_secs;
            match tokio::time::timeout(Duration::from_secs(secs), connect).await {
                Ok(connected) => Box::new(connected?),
                Err(_) => {
                    return Err(Error::ConnectTimeout {
                        endpoint: endpoint.to_string(),
                        secs,
                    })
                }
            }
        } else if let Some(transport) = self.registry.provide_transport(config, &session_id)? {
            transport
        } else {
            let executable = self.registry.provide_executable(config)?;
            Box::new(ProcessTransport::start(&executable)?)
        };

        let factory = self
            .registry
            .session_factory(&config.debug_type)
            .unwrap_or_else(|| self.default_factory.clone());

        let session = factory.create(&session_id, transport);
        self.sessions.lock().insert(session_id.clone(), session);

        tracing::info!(session_id = %session_id, "Debug adapter session created");
        Ok(session_id)
    }

    /// Find a session by id; `None` means not found
    pub fn find(&self, session_id: &str) -> Option<Arc<DebugAdapterSession>> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// Remove a session from the index
    ///
    /// Removal only; disposing the session is the caller's business.
    pub fn remove(&self, session_id: &str) {
        self.sessions.lock().remove(session_id);
    }

    /// Snapshot of all live sessions
    pub fn get_all(&self) -> Vec<Arc<DebugAdapterSession>> {
        self.sessions.lock().values().cloned().collect()
    }

    /// Number of indexed sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Open the bidirectional message channel of a session
    ///
    /// `None` when the id is unknown or the channel was already taken.
    pub fn open_channel(&self, session_id: &str) -> Option<SessionChannel> {
        SessionChannel::open(&self.find(session_id)?)
    }

    /// Dispose every session and clear the index
    ///
    /// Guarantees adapter process termination on manager-level shutdown.
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = {
            let mut index = self.sessions.lock();
            index.drain().map(|(_, session)| session).collect()
        };

        tracing::info!(count = sessions.len(), "Shutting down all debug sessions");
        futures_util::future::join_all(sessions.iter().map(|session| session.dispose())).await;
    }
}
