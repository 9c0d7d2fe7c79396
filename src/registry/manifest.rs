//! Manifest-backed adapter contributions
//!
//! Debug adapters distributed as packages carry a JSON descriptor next to
//! their program files. This module resolves such a descriptor into an
//! executable descriptor: localized `%key%` placeholders are substituted
//! from a sibling localization map, relative paths are resolved against the
//! install root, and a `node` runtime selects the module launch form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::{Error, Result};
use crate::model::{DebugAdapterExecutable, DebugConfiguration};

use super::DebugAdapterContribution;

/// Descriptor file inside an adapter install root
pub const MANIFEST_FILE: &str = "adapter.json";
/// Optional sibling localization map
pub const NLS_FILE: &str = "adapter.nls.json";

/// Parsed adapter descriptor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterManifest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub runtime_args: Option<Vec<String>>,
    #[serde(default)]
    pub linux: Option<PlatformOverride>,
    #[serde(default)]
    pub osx: Option<PlatformOverride>,
    #[serde(default)]
    pub windows: Option<PlatformOverride>,
}

/// Platform-specific descriptor fields; any field set here wins
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverride {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub runtime_args: Option<Vec<String>>,
}

/// Contribution backed by a packaged adapter descriptor on disk
#[derive(Debug)]
pub struct ManifestAdapterContribution {
    debug_type: String,
    install_root: PathBuf,
    manifest: AdapterManifest,
}

impl ManifestAdapterContribution {
    /// Load the descriptor (and localization map, if present) from an install root
    pub fn load(debug_type: &str, install_root: &Path) -> Result<Self> {
        let manifest_path = install_root.join(MANIFEST_FILE);
        let mut text = std::fs::read_to_string(&manifest_path)
            .map_err(|e| Error::manifest(manifest_path.display().to_string(), e))?;

        let nls_path = install_root.join(NLS_FILE);
        if nls_path.exists() {
            let nls_text = std::fs::read_to_string(&nls_path)
                .map_err(|e| Error::manifest(nls_path.display().to_string(), e))?;
            let nls: HashMap<String, String> = serde_json::from_str(&nls_text)
                .map_err(|e| Error::manifest(nls_path.display().to_string(), e))?;
            text = substitute_placeholders(&text, &nls);
        }

        let manifest: AdapterManifest = serde_json::from_str(&text)
            .map_err(|e| Error::manifest(manifest_path.display().to_string(), e))?;

        tracing::debug!(
            debug_type = %debug_type,
            install_root = %install_root.display(),
            "Loaded adapter manifest"
        );

        Ok(Self::from_manifest(debug_type, install_root, manifest))
    }

    /// Build a contribution from an already-parsed manifest
    pub fn from_manifest(
        debug_type: &str,
        install_root: &Path,
        manifest: AdapterManifest,
    ) -> Self {
        Self {
            debug_type: debug_type.to_string(),
            install_root: install_root.to_path_buf(),
            manifest,
        }
    }

    /// Debug type this contribution serves
    pub fn debug_type(&self) -> &str {
        &self.debug_type
    }

    fn platform_override(&self) -> Option<&PlatformOverride> {
        #[cfg(target_os = "linux")]
        return self.manifest.linux.as_ref();

        #[cfg(target_os = "macos")]
        return self.manifest.osx.as_ref();

        #[cfg(target_os = "windows")]
        return self.manifest.windows.as_ref();

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        return None;
    }

    /// Resolve the descriptor to an executable, or `None` without a program
    fn executable(&self) -> Option<DebugAdapterExecutable> {
        let platform = self.platform_override();

        let program = platform
            .and_then(|p| p.program.clone())
            .or_else(|| self.manifest.program.clone())?;
        let program = resolve_against(&self.install_root, &program);

        let program_args = platform
            .and_then(|p| p.args.clone())
            .or_else(|| self.manifest.args.clone())
            .unwrap_or_default();

        let runtime = platform
            .and_then(|p| p.runtime.clone())
            .or_else(|| self.manifest.runtime.clone())
            .map(|r| {
                // a packaged runtime ships relative to the install root
                if r.starts_with("./") {
                    self.install_root
                        .join(r.trim_start_matches("./"))
                        .to_string_lossy()
                        .into_owned()
                } else {
                    r
                }
            });

        let runtime_args = platform
            .and_then(|p| p.runtime_args.clone())
            .or_else(|| self.manifest.runtime_args.clone())
            .unwrap_or_default();

        match runtime.as_deref() {
            // Adapters on the host's own module runtime launch in module
            // form, keeping runtime flags separate from program arguments.
            Some("node") => Some(DebugAdapterExecutable::Module {
                module_path: program,
                exec_argv: runtime_args,
                args: program_args,
            }),
            Some(runtime) => {
                let mut args = runtime_args;
                args.push(program.to_string_lossy().into_owned());
                args.extend(program_args);
                Some(DebugAdapterExecutable::Command {
                    command: runtime.to_string(),
                    args,
                })
            }
            None => Some(DebugAdapterExecutable::Command {
                command: program.to_string_lossy().into_owned(),
                args: program_args,
            }),
        }
    }
}

impl DebugAdapterContribution for ManifestAdapterContribution {
    fn provide_adapter_executable(
        &self,
        _config: &DebugConfiguration,
    ) -> Result<Option<DebugAdapterExecutable>> {
        Ok(self.executable())
    }
}

/// Replace `%key%` tokens with localized values
///
/// Plain string substitution: keys are never treated as patterns. Quotes in
/// values are escaped because the substitution happens in raw JSON text.
fn substitute_placeholders(text: &str, nls: &HashMap<String, String>) -> String {
    let mut text = text.to_string();
    for (key, value) in nls {
        let value = value.replace('"', "\\\"");
        text = text.replace(&format!("%{}%", key), &value);
    }
    text
}

fn resolve_against(install_root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        install_root.join(path)
    }
}
