//! End-to-end session lifecycle tests
//!
//! These drive the whole stack — service, manager, registry, session,
//! transport, codec — against real adapters: an external process (`cat`
//! echoes frames back unchanged) and an in-process echo worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use dap_bridge::common::config::Config;
use dap_bridge::common::Result;
use dap_bridge::registry::DebugAdapterContribution;
use dap_bridge::session::{
    DebugAdapterSession, DebugAdapterSessionFactory, SessionChannel, SessionState,
};
use dap_bridge::transport::{
    AdapterWorker, ControlSignal, Transport, WorkerMessage, WorkerTransport,
};
use dap_bridge::{
    DebugAdapterContributionRegistry, DebugAdapterExecutable, DebugAdapterSessionManager,
    DebugConfiguration, DebugService,
};

fn build_service(registry: DebugAdapterContributionRegistry) -> DebugService {
    let manager = Arc::new(DebugAdapterSessionManager::new(
        Arc::new(registry),
        &Config::default(),
    ));
    DebugService::new(manager)
}

async fn recv_timeout(channel: &mut SessionChannel) -> String {
    tokio::time::timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("timed out waiting for a session message")
        .expect("session channel ended unexpectedly")
}

/// Adapter hosted in-process: echoes every payload back verbatim.
struct EchoWorker;

#[async_trait]
impl AdapterWorker for EchoWorker {
    async fn run(
        self: Box<Self>,
        mut inbox: mpsc::UnboundedReceiver<WorkerMessage>,
        outbox: mpsc::UnboundedSender<WorkerMessage>,
    ) {
        while let Some(message) = inbox.recv().await {
            match message {
                WorkerMessage::Data(payload) => {
                    let _ = outbox.send(WorkerMessage::Data(payload));
                }
                WorkerMessage::Control(ControlSignal::Terminate) => break,
                WorkerMessage::Control(_) => {}
            }
        }
        let _ = outbox.send(WorkerMessage::Control(ControlSignal::Exited { code: 0 }));
    }
}

/// Contribution that hosts its adapter on a worker task.
struct EchoWorkerContribution;

impl DebugAdapterContribution for EchoWorkerContribution {
    fn create_transport(&self, _session_id: &str) -> Result<Option<Box<dyn Transport>>> {
        Ok(Some(Box::new(WorkerTransport::spawn(EchoWorker))))
    }
}

#[cfg(unix)]
mod process_adapter {
    use super::*;

    /// `cat` copies stdin to stdout, so every frame written comes straight
    /// back and decodes to the original message.
    struct CatAdapterContribution;

    impl DebugAdapterContribution for CatAdapterContribution {
        fn provide_adapter_executable(
            &self,
            _config: &DebugConfiguration,
        ) -> Result<Option<DebugAdapterExecutable>> {
            Ok(Some(DebugAdapterExecutable::Command {
                command: "cat".to_string(),
                args: vec![],
            }))
        }
    }

    #[tokio::test]
    async fn node_contribution_lifecycle() {
        let mut registry = DebugAdapterContributionRegistry::new();
        registry.register("node", Arc::new(CatAdapterContribution));
        let service = build_service(registry);

        let mut config = DebugConfiguration::new("node");
        config
            .parameters
            .insert("program".to_string(), serde_json::json!("x.js"));

        let session_id = service.create_debug_session(&config).await.unwrap();
        assert!(!session_id.is_empty());

        let session = service.manager().find(&session_id).expect("find after create");
        assert_eq!(session.id(), session_id);
        assert_eq!(session.state(), SessionState::Active);

        // Frames written to the adapter come back decoded.
        let mut channel = service.open_channel(&session_id).unwrap();
        channel.send("{\"seq\":1,\"command\":\"initialize\"}").await;
        assert_eq!(
            recv_timeout(&mut channel).await,
            "{\"seq\":1,\"command\":\"initialize\"}"
        );

        // Multiple messages preserve order.
        channel.send("{\"seq\":2}").await;
        channel.send("{\"seq\":3}").await;
        assert_eq!(recv_timeout(&mut channel).await, "{\"seq\":2}");
        assert_eq!(recv_timeout(&mut channel).await, "{\"seq\":3}");

        service.stop(&session_id).await;
        assert!(service.manager().find(&session_id).is_none());
        assert_eq!(session.state(), SessionState::Disposed);

        // Stopping again is a no-op, not an error.
        service.stop(&session_id).await;
    }

    /// Adapter that exits immediately, closing its stdout without a word.
    struct ShortLivedAdapterContribution;

    impl DebugAdapterContribution for ShortLivedAdapterContribution {
        fn provide_adapter_executable(
            &self,
            _config: &DebugConfiguration,
        ) -> Result<Option<DebugAdapterExecutable>> {
            Ok(Some(DebugAdapterExecutable::Command {
                command: "true".to_string(),
                args: vec![],
            }))
        }
    }

    #[tokio::test]
    async fn adapter_exit_produces_one_exited_event() {
        let mut registry = DebugAdapterContributionRegistry::new();
        registry.register("short", Arc::new(ShortLivedAdapterContribution));
        let service = build_service(registry);

        let session_id = service
            .create_debug_session(&DebugConfiguration::new("short"))
            .await
            .unwrap();
        let mut channel = service.open_channel(&session_id).unwrap();

        let event: serde_json::Value =
            serde_json::from_str(&recv_timeout(&mut channel).await).unwrap();
        assert_eq!(event["event"], "exited");
        assert_eq!(event["body"]["exitCode"], 1);

        // Exactly one terminal notification.
        let extra = tokio::time::timeout(Duration::from_millis(200), channel.recv()).await;
        assert!(extra.is_err(), "expected no event after exited, got {:?}", extra);

        service.stop(&session_id).await;
    }
}

#[tokio::test]
async fn worker_contribution_end_to_end() {
    let mut registry = DebugAdapterContributionRegistry::new();
    registry.register("mock-worker", Arc::new(EchoWorkerContribution));
    let service = build_service(registry);

    let session_id = service
        .create_debug_session(&DebugConfiguration::new("mock-worker"))
        .await
        .unwrap();

    let mut channel = service.open_channel(&session_id).unwrap();
    channel.send("{\"seq\":1,\"command\":\"threads\"}").await;
    assert_eq!(
        recv_timeout(&mut channel).await,
        "{\"seq\":1,\"command\":\"threads\"}"
    );

    service.stop(&session_id).await;
    assert!(service.debug_sessions().is_empty());
}

#[tokio::test]
async fn contribution_session_factory_overrides_the_default() {
    struct MarkingFactory {
        used: Arc<AtomicBool>,
    }

    impl DebugAdapterSessionFactory for MarkingFactory {
        fn create(
            &self,
            session_id: &str,
            transport: Box<dyn Transport>,
        ) -> Arc<DebugAdapterSession> {
            self.used.store(true, Ordering::SeqCst);
            DebugAdapterSession::new(session_id, transport)
        }
    }

    struct FactoryContribution {
        used: Arc<AtomicBool>,
    }

    impl DebugAdapterContribution for FactoryContribution {
        fn create_transport(&self, _session_id: &str) -> Result<Option<Box<dyn Transport>>> {
            Ok(Some(Box::new(WorkerTransport::spawn(EchoWorker))))
        }

        fn session_factory(&self) -> Option<Arc<dyn DebugAdapterSessionFactory>> {
            Some(Arc::new(MarkingFactory {
                used: self.used.clone(),
            }))
        }
    }

    let used = Arc::new(AtomicBool::new(false));
    let mut registry = DebugAdapterContributionRegistry::new();
    registry.register("mock-worker", Arc::new(FactoryContribution { used: used.clone() }));
    let service = build_service(registry);

    let session_id = service
        .create_debug_session(&DebugConfiguration::new("mock-worker"))
        .await
        .unwrap();
    assert!(used.load(Ordering::SeqCst));

    service.stop(&session_id).await;
}

#[tokio::test]
async fn concurrent_sessions_stay_independent() {
    let mut registry = DebugAdapterContributionRegistry::new();
    registry.register("mock-worker", Arc::new(EchoWorkerContribution));
    let service = build_service(registry);

    let config = DebugConfiguration::new("mock-worker");
    let a = service.create_debug_session(&config).await.unwrap();
    let b = service.create_debug_session(&config).await.unwrap();
    assert_ne!(a, b);

    let mut channel_a = service.open_channel(&a).unwrap();
    let mut channel_b = service.open_channel(&b).unwrap();

    channel_a.send("{\"from\":\"a\"}").await;
    channel_b.send("{\"from\":\"b\"}").await;

    assert_eq!(recv_timeout(&mut channel_a).await, "{\"from\":\"a\"}");
    assert_eq!(recv_timeout(&mut channel_b).await, "{\"from\":\"b\"}");

    // stopping one session leaves the other routing
    service.stop(&a).await;
    channel_b.send("{\"still\":\"up\"}").await;
    assert_eq!(recv_timeout(&mut channel_b).await, "{\"still\":\"up\"}");

    service.dispose().await;
    assert!(service.manager().is_empty());
}
