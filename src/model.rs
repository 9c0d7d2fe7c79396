//! Debug configuration records and adapter launch descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A debug configuration handed to the bridge by the client
///
/// Only `type` and `debugServer` are meaningful to the bridge; everything
/// else (program, launch arguments, adapter options) is carried opaquely for
/// the adapter's benefit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfiguration {
    /// Debug type looked up in the contribution registry
    #[serde(rename = "type")]
    pub debug_type: String,

    /// Human-readable configuration name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Endpoint of an already-running adapter to attach to
    ///
    /// When present the bridge connects instead of spawning an adapter.
    #[serde(default, rename = "debugServer", skip_serializing_if = "Option::is_none")]
    pub debug_server: Option<DebugServerEndpoint>,

    /// Launch parameters passed through to the adapter untouched
    #[serde(flatten)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl DebugConfiguration {
    /// Create a minimal configuration for a debug type
    pub fn new(debug_type: impl Into<String>) -> Self {
        Self {
            debug_type: debug_type.into(),
            name: None,
            debug_server: None,
            parameters: serde_json::Map::new(),
        }
    }
}

/// Endpoint of a running debug adapter server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugServerEndpoint {
    /// TCP port on localhost
    Port(u16),
    /// TCP host and port
    Tcp { host: String, port: u16 },
    /// Named pipe / Unix domain socket path
    Pipe { pipe: PathBuf },
}

impl fmt::Display for DebugServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(port) => write!(f, "127.0.0.1:{}", port),
            Self::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Self::Pipe { pipe } => write!(f, "{}", pipe.display()),
        }
    }
}

/// How to launch a debug adapter process
///
/// The `Module` form is used when the adapter runs on the host's own module
/// runtime (a `runtime = "node"` manifest entry); it carries the runtime
/// arguments separately so the spawner can place them before the module path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugAdapterExecutable {
    /// Spawn a JavaScript adapter module through the node runtime
    Module {
        #[serde(rename = "modulePath")]
        module_path: PathBuf,
        #[serde(default, rename = "execArgv")]
        exec_argv: Vec<String>,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Spawn a plain executable
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}
