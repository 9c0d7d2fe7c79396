//! External-facing debug service
//!
//! The create/stop/list API consumed by the client layer. The facade keeps
//! its own set of session ids it has created — a thin liveness record,
//! distinct from the manager's object index — so its own teardown only
//! touches sessions it handed out.

use std::collections::HashSet;
use std::sync::Arc;

use crate::common::Result;
use crate::manager::DebugAdapterSessionManager;
use crate::model::DebugConfiguration;
use crate::session::SessionChannel;

/// Facade over the session manager used by the client layer
pub struct DebugService {
    manager: Arc<DebugAdapterSessionManager>,
    sessions: parking_lot::Mutex<HashSet<String>>,
}

impl DebugService {
    pub fn new(manager: Arc<DebugAdapterSessionManager>) -> Self {
        Self {
            manager,
            sessions: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// The session manager backing this service
    pub fn manager(&self) -> &Arc<DebugAdapterSessionManager> {
        &self.manager
    }

    /// Create a debug session and return its id
    pub async fn create_debug_session(&self, config: &DebugConfiguration) -> Result<String> {
        let session_id = self.manager.create(config).await?;
        self.sessions.lock().insert(session_id.clone());
        Ok(session_id)
    }

    /// Stop a session; unknown ids are a no-op
    pub async fn stop(&self, session_id: &str) {
        self.do_stop(session_id).await;
    }

    async fn do_stop(&self, session_id: &str) {
        if let Some(session) = self.manager.find(session_id) {
            self.manager.remove(session_id);
            self.sessions.lock().remove(session_id);
            session.dispose().await;
        }
    }

    /// Ids of the sessions this service has created and not yet stopped
    pub fn debug_sessions(&self) -> Vec<String> {
        self.sessions.lock().iter().cloned().collect()
    }

    /// Open the per-session message channel for a created session
    pub fn open_channel(&self, session_id: &str) -> Option<SessionChannel> {
        self.manager.open_channel(session_id)
    }

    /// Terminate every session this service created
    pub async fn dispose(&self) {
        let ids: Vec<String> = self.sessions.lock().iter().cloned().collect();
        tracing::info!(count = ids.len(), "Terminating all tracked debug sessions");
        futures_util::future::join_all(ids.iter().map(|id| self.do_stop(id))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;
    use crate::model::DebugServerEndpoint;
    use crate::registry::DebugAdapterContributionRegistry;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn endpoint_fixture() -> DebugServerEndpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
                });
            }
        });
        DebugServerEndpoint::Port(port)
    }

    fn service() -> DebugService {
        let registry = Arc::new(DebugAdapterContributionRegistry::new());
        let manager = Arc::new(DebugAdapterSessionManager::new(registry, &Config::default()));
        DebugService::new(manager)
    }

    #[tokio::test]
    async fn created_sessions_are_listed_until_stopped() {
        let service = service();
        let endpoint = endpoint_fixture().await;

        let mut config = DebugConfiguration::new("node");
        config.debug_server = Some(endpoint);

        let id = service.create_debug_session(&config).await.unwrap();
        assert_eq!(service.debug_sessions(), vec![id.clone()]);
        assert!(service.manager().find(&id).is_some());

        service.stop(&id).await;
        assert!(service.debug_sessions().is_empty());
        assert!(service.manager().find(&id).is_none());
    }

    #[tokio::test]
    async fn stopping_an_unknown_id_is_a_no_op() {
        let service = service();
        service.stop("no-such-session").await;
        assert!(service.debug_sessions().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_tracks_nothing() {
        let service = service();
        let err = service
            .create_debug_session(&DebugConfiguration::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::common::Error::NotFound(_)));
        assert!(service.debug_sessions().is_empty());
        assert!(service.manager().is_empty());
    }

    #[tokio::test]
    async fn dispose_terminates_every_tracked_session() {
        let service = service();
        let endpoint = endpoint_fixture().await;

        let mut config = DebugConfiguration::new("node");
        config.debug_server = Some(endpoint);

        let a = service.create_debug_session(&config).await.unwrap();
        let b = service.create_debug_session(&config).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(service.debug_sessions().len(), 2);

        service.dispose().await;
        assert!(service.debug_sessions().is_empty());
        assert!(service.manager().is_empty());
    }
}
