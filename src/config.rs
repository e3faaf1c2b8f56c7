//! Configuration types for the verifier.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Registry document overrides
    pub registry: RegistrySettings,

    /// DNS resolver settings
    pub resolver: ResolverSettings,
}

/// Registry document locations. When unset, the bundled documents are
/// used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Path to a bot definition document (JSON)
    pub bots_path: Option<PathBuf>,

    /// Path to a hostile pattern document (JSON)
    pub hostile_path: Option<PathBuf>,
}

/// DNS resolver tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Number of retries for each lookup
    pub attempts: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            attempts: 2,
        }
    }
}
