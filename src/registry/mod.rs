//! Debug adapter contribution registry
//!
//! Maps a debug type to the contributions able to produce a runnable
//! adapter for it. Populated once at startup, then shared read-only with
//! the session manager.

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::model::{DebugAdapterExecutable, DebugConfiguration};
use crate::session::DebugAdapterSessionFactory;
use crate::transport::Transport;

pub mod manifest;

pub use manifest::ManifestAdapterContribution;

/// A pluggable provider of adapter-launch information for one debug type
///
/// A contribution supplies an executable descriptor (spawn a new adapter
/// process), a ready transport (adapters hosted in-process), and/or a
/// custom session factory. All hooks default to "not provided".
pub trait DebugAdapterContribution: Send + Sync {
    /// Describe how to launch an adapter process for this configuration
    fn provide_adapter_executable(
        &self,
        _config: &DebugConfiguration,
    ) -> Result<Option<DebugAdapterExecutable>> {
        Ok(None)
    }

    /// Produce a ready transport instead of a spawn/connect descriptor
    fn create_transport(&self, _session_id: &str) -> Result<Option<Box<dyn Transport>>> {
        Ok(None)
    }

    /// Custom session factory for this debug type
    fn session_factory(&self) -> Option<Arc<dyn DebugAdapterSessionFactory>> {
        None
    }
}

/// Registry of debug adapter contributions, keyed by debug type
#[derive(Default)]
pub struct DebugAdapterContributionRegistry {
    contributions: HashMap<String, Vec<Arc<dyn DebugAdapterContribution>>>,
}

impl DebugAdapterContributionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contribution for a debug type
    ///
    /// Contributions are kept in registration order and are not
    /// de-duplicated; lookups take the first match.
    pub fn register(
        &mut self,
        debug_type: impl Into<String>,
        contribution: Arc<dyn DebugAdapterContribution>,
    ) {
        let debug_type = debug_type.into();
        tracing::debug!(debug_type = %debug_type, "Registering debug adapter contribution");
        self.contributions
            .entry(debug_type)
            .or_default()
            .push(contribution);
    }

    /// Register manifest-backed contributions for every configured adapter install
    pub fn register_config_adapters(&mut self, config: &Config) -> Result<()> {
        for (debug_type, install) in &config.adapters {
            let contribution =
                ManifestAdapterContribution::load(debug_type, &install.install_root)?;
            self.register(debug_type.clone(), Arc::new(contribution));
        }
        Ok(())
    }

    /// Contributions registered for a debug type, in registration order
    pub fn resolve(&self, debug_type: &str) -> &[Arc<dyn DebugAdapterContribution>] {
        self.contributions
            .get(debug_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Registered debug types
    pub fn debug_types(&self) -> Vec<&str> {
        self.contributions.keys().map(String::as_str).collect()
    }

    /// First executable descriptor offered for this configuration
    ///
    /// Fails with `NotFound` when no contribution for the type produces one.
    pub fn provide_executable(
        &self,
        config: &DebugConfiguration,
    ) -> Result<DebugAdapterExecutable> {
        for contribution in self.resolve(&config.debug_type) {
            if let Some(executable) = contribution.provide_adapter_executable(config)? {
                return Ok(executable);
            }
        }
        Err(Error::NotFound(config.debug_type.clone()))
    }

    /// First ready transport offered for this configuration, if any
    pub fn provide_transport(
        &self,
        config: &DebugConfiguration,
        session_id: &str,
    ) -> Result<Option<Box<dyn Transport>>> {
        for contribution in self.resolve(&config.debug_type) {
            if let Some(transport) = contribution.create_transport(session_id)? {
                return Ok(Some(transport));
            }
        }
        Ok(None)
    }

    /// First contribution-supplied session factory for a debug type
    pub fn session_factory(&self, debug_type: &str) -> Option<Arc<dyn DebugAdapterSessionFactory>> {
        self.resolve(debug_type)
            .iter()
            .find_map(|contribution| contribution.session_factory())
    }
}
