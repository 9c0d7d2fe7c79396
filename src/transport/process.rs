//! Child process transport
//!
//! Spawns a debug adapter executable and speaks to it over piped
//! stdin/stdout. Adapter stderr is inherited so adapter diagnostics reach
//! the host's own stderr.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::common::{Error, Result};
use crate::model::DebugAdapterExecutable;

use super::{pump_reader, Transport, TransportEvent};

/// Transport over a spawned adapter process's stdio pipes
#[derive(Debug)]
pub struct ProcessTransport {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    pid: Option<u32>,
    disposed: bool,
}

impl ProcessTransport {
    /// Spawn the adapter described by an executable descriptor
    pub fn start(executable: &DebugAdapterExecutable) -> Result<Self> {
        let (program, args) = spawn_form(executable)?;

        tracing::debug!(program = %program, args = ?args, "Spawning debug adapter");

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        // Own process group, so disposal can take down the adapter and any
        // helpers it forks in one signal.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::spawn_failed(program.as_str(), e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::spawn_failed(program.as_str(), "failed to get adapter stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::spawn_failed(program.as_str(), "failed to get adapter stdout"))?;

        let pid = child.id();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump_reader(stdout, tx));

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            events: Some(rx),
            pid,
            disposed: false,
        })
    }

    /// OS process id of the adapter, while it is running
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(Error::TransportClosed)?;
        stdin.write_all(bytes).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        // Close stdin first; well-behaved adapters exit on EOF.
        self.stdin.take();

        if let Some(mut child) = self.child.take() {
            // Normal child-process exit handling does not cross the
            // process-group boundary, so signal the whole group by id.
            #[cfg(unix)]
            if let Some(pid) = self.pid {
                unsafe {
                    libc::kill(-(pid as i32), libc::SIGKILL);
                }
            }

            let _ = child.start_kill();
            if let Err(e) = child.wait().await {
                tracing::debug!(error = %e, "Failed to reap adapter process");
            }
        }

        Ok(())
    }
}

/// Reduce an executable descriptor to a spawnable (program, args) pair
///
/// The module form runs through the node runtime with its exec arguments
/// placed before the module path.
fn spawn_form(executable: &DebugAdapterExecutable) -> Result<(String, Vec<String>)> {
    match executable {
        DebugAdapterExecutable::Command { command, args } => {
            Ok((resolve_program(command), args.clone()))
        }
        DebugAdapterExecutable::Module {
            module_path,
            exec_argv,
            args,
        } => {
            let node = resolve_program("node");
            let mut full_args = exec_argv.clone();
            full_args.push(module_path.to_string_lossy().into_owned());
            full_args.extend(args.iter().cloned());
            Ok((node, full_args))
        }
    }
}

/// Resolve a bare command name against PATH
///
/// Explicit paths are kept as-is; unresolvable names are also kept so the
/// spawn error names the command the caller asked for.
fn resolve_program(command: &str) -> String {
    if Path::new(command).components().count() > 1 {
        return command.to_string();
    }
    match which::which(command) {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(_) => command.to_string(),
    }
}
