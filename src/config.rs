use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyze::{CatalogConfig, PermissionCatalog};
use crate::corpus::CorpusOptions;
use crate::unpack::ArchiveLimits;

/// Top-level configuration from `extperm.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ArchiveLimits,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Worker count. Unset means one per available CPU.
    pub workers: Option<usize>,
    /// Per-package deadline in seconds; 0 disables it.
    pub package_timeout_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            workers: None,
            package_timeout_secs: 120,
        }
    }
}

impl CorpusConfig {
    pub fn options(&self) -> CorpusOptions {
        let defaults = CorpusOptions::default();
        CorpusOptions {
            workers: self.workers.filter(|&n| n > 0).unwrap_or(defaults.workers),
            package_timeout: match self.package_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog file (`.toml` or JSON).
    pub path: Option<PathBuf>,
    /// Merge the file into the built-in catalog instead of replacing it.
    pub extend_builtin: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: None,
            extend_builtin: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Build the permission catalog these settings describe.
    pub fn build_catalog(&self) -> Result<PermissionCatalog> {
        let Some(ref path) = self.catalog.path else {
            return Ok(PermissionCatalog::builtin());
        };

        let loaded = CatalogConfig::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        let config = if self.catalog.extend_builtin {
            CatalogConfig::builtin().merge(loaded)
        } else {
            loaded
        };

        PermissionCatalog::from_config(config)
            .with_context(|| format!("invalid catalog {}", path.display()))
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# extperm configuration

[scan]
# Maximum members per archive.
max_entries = 10000
# Maximum decompressed size of one member, in bytes.
max_entry_size = 104857600
# Maximum decompressed bytes read from one archive.
max_total_size = 1073741824

[corpus]
# Packages analysed at once (defaults to the CPU count).
# workers = 8
# Per-package deadline in seconds, 0 to disable.
package_timeout_secs = 120

[catalog]
# Extra permission patterns, TOML or JSON.
# path = "catalog.toml"
# Merge into the built-in catalog rather than replacing it.
extend_builtin = true
"#
    }
}
