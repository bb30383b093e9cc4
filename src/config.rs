//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dataforge/dataforge.toml`
//! 3. Environment variables: `DATAFORGE_*` prefix

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::application::{ApplicationError, ApplicationResult};
use crate::application::region::DEFAULT_REGION;
use crate::infrastructure::traits::FileHierarchySource;

/// Resolved settings after layering.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `<nesting>.properties` hierarchy files
    pub data_dir: PathBuf,
    /// Region assumed when no scoped override is active
    pub default_region: String,
    /// Whether generator trees substitute fallbacks for missing datasets
    pub fallback_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            default_region: DEFAULT_REGION.to_string(),
            fallback_enabled: true,
        }
    }
}

/// Raw settings for intermediate parsing (fields are Option to detect "not
/// specified" during layering).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<String>,
    pub default_region: Option<String>,
    pub fallback_enabled: Option<bool>,
}

impl Settings {
    /// Load layered settings: defaults, then the global config file, then
    /// `DATAFORGE_*` environment variables.
    pub fn load() -> ApplicationResult<Self> {
        let mut builder = Config::builder();
        if let Some(dirs) = ProjectDirs::from("", "", "dataforge") {
            let global = dirs.config_dir().join("dataforge.toml");
            builder = builder.add_source(File::from(global).required(false));
        }
        builder = builder.add_source(Environment::with_prefix("DATAFORGE"));
        let raw: RawSettings = builder
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSettings) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: raw
                .data_dir
                .map(|d| PathBuf::from(expand_env_vars(&d)))
                .unwrap_or(defaults.data_dir),
            default_region: raw.default_region.unwrap_or(defaults.default_region),
            fallback_enabled: raw.fallback_enabled.unwrap_or(defaults.fallback_enabled),
        }
    }

    /// File-backed hierarchy source rooted at the configured data directory.
    pub fn hierarchy_source(&self) -> FileHierarchySource {
        FileHierarchySource::new(&self.data_dir)
    }
}

fn config_error(e: config::ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}`, and `~` for the home directory. Uses the
/// shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_unspecified_fields() {
        let settings = Settings::from_raw(RawSettings {
            data_dir: Some("hier".to_string()),
            default_region: None,
            fallback_enabled: None,
        });
        assert_eq!(settings.data_dir, PathBuf::from("hier"));
        assert_eq!(settings.default_region, DEFAULT_REGION);
        assert!(settings.fallback_enabled);
    }

    #[test]
    fn test_expand_env_vars_passes_plain_paths_through() {
        assert_eq!(expand_env_vars("data/regions"), "data/regions");
    }
}
