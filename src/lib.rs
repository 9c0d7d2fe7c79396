//! Multi-session Debug Adapter Protocol bridge
//!
//! Multiplexes concurrent debug sessions between a client and
//! heterogeneous debug adapters: spawned executables, TCP / named-pipe
//! servers, and in-process workers. The bridge frames and routes traffic
//! and manages session lifecycles; message bodies stay opaque.

pub mod common;
pub mod manager;
pub mod model;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod session;
pub mod transport;

// Re-export the types most hosts need
pub use common::{Error, Result};
pub use manager::DebugAdapterSessionManager;
pub use model::{DebugAdapterExecutable, DebugConfiguration, DebugServerEndpoint};
pub use registry::{DebugAdapterContribution, DebugAdapterContributionRegistry};
pub use service::DebugService;
pub use session::{DebugAdapterSession, SessionChannel, DEBUG_ADAPTER_PATH};
