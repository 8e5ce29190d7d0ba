//! Build configuration module.
//!
//! Handles loading and validating `jsgroup.toml`. All settings have stock
//! defaults, so a config file is only needed to override them — a missing
//! file is a valid (all-defaults) configuration.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! group = "app"              # Group name; artifacts are {group}_{mode}.js
//! source_root = "src-js"     # Directory the start file and includes live in
//! start = "app.js"           # Root source file, relative to source_root
//! dest = "dist"              # Output directory for generated artifacts
//! modes = ["development", "production"]  # Modes to generate
//! version = "0.0.0"          # Expanded by the version directive
//!
//! [resources]
//! cache_dir = ".jsgroup-cache"  # On-disk resource cache
//! origin = "vendor"             # Directory resolved for cache misses
//! libraries = []                # Logical paths of libraries to append
//! # engine = "engine/engine"    # Logical path of the runtime engine
//! # compat_helpers = "engine/helpers"  # Helpers for the compat engine
//! ```
//!
//! Config files are sparse — override just the values you want. Unknown
//! keys are rejected to catch typos early.

use crate::modes::GenerationMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `jsgroup.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Group name; generated artifacts are named `{group}_{suffix}.js`.
    pub group: String,
    /// Directory the start file and its includes live in.
    pub source_root: String,
    /// Root source file, relative to `source_root`.
    pub start: String,
    /// Output directory for generated artifacts.
    pub dest: String,
    /// Modes to generate artifacts for.
    pub modes: Vec<GenerationMode>,
    /// Version string expanded by the version directive.
    pub version: String,
    /// External resource resolution (libraries, engine).
    pub resources: ResourcesConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            group: "app".to_string(),
            source_root: "src-js".to_string(),
            start: "app.js".to_string(),
            dest: "dist".to_string(),
            modes: vec![GenerationMode::Development, GenerationMode::Production],
            version: "0.0.0".to_string(),
            resources: ResourcesConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group.is_empty() {
            return Err(ConfigError::Validation("group must not be empty".into()));
        }
        if self.modes.is_empty() {
            return Err(ConfigError::Validation("modes must not be empty".into()));
        }
        for (i, mode) in self.modes.iter().enumerate() {
            if self.modes[..i].contains(mode) {
                return Err(ConfigError::Validation(format!(
                    "duplicate mode: {mode}"
                )));
            }
        }
        Ok(())
    }
}

/// External resource resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesConfig {
    /// On-disk cache directory, consulted before the origin.
    pub cache_dir: String,
    /// Origin directory resolved on cache misses.
    pub origin: String,
    /// Logical paths of libraries appended to every artifact. Each path is
    /// fetched twice, as `{path}.js` and `{path}.min.js`.
    pub libraries: Vec<String>,
    /// Logical path of the runtime engine prepended to artifacts.
    pub engine: Option<String>,
    /// Logical path of the helpers required by the compat engine.
    pub compat_helpers: Option<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            cache_dir: ".jsgroup-cache".to_string(),
            origin: "vendor".to_string(),
            libraries: Vec::new(),
            engine: None,
            compat_helpers: None,
        }
    }
}

/// Load config from a `jsgroup.toml` file.
///
/// A missing file yields the stock defaults; a present file is parsed with
/// unknown keys rejected, then validated.
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    let config = if path.exists() {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        BuildConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `jsgroup.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r#"# jsgroup Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Group name; generated artifacts are named {group}_{mode}.js plus a
# {group}_{mode}_compat.js sibling per mode.
group = "app"

# Directory the start file and its includes live in.
source_root = "src-js"

# Root source file, relative to source_root.
start = "app.js"

# Output directory for generated artifacts.
dest = "dist"

# Modes to generate. Available:
#   development, testing, stats, doc, production, production-debug
modes = ["development", "production"]

# Version string expanded wherever sources use the version directive.
version = "0.0.0"

# ---------------------------------------------------------------------------
# External resources
# ---------------------------------------------------------------------------
[resources]
# On-disk resource cache, consulted before the origin.
cache_dir = ".jsgroup-cache"

# Directory resolved for cache misses.
origin = "vendor"

# Logical paths of libraries appended to every artifact. Each path is
# fetched twice, as {path}.js and {path}.min.js; missing files are skipped.
libraries = []

# Logical path of the runtime engine prepended to artifacts.
# engine = "engine/engine"

# Helpers required by the compat engine; without them the compat
# variant ships without an engine prelude.
# compat_helpers = "engine/helpers"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BuildConfig::default();
        assert_eq!(config.group, "app");
        assert_eq!(config.source_root, "src-js");
        assert_eq!(config.start, "app.js");
        assert_eq!(config.dest, "dist");
        assert_eq!(
            config.modes,
            vec![GenerationMode::Development, GenerationMode::Production]
        );
        assert_eq!(config.resources.cache_dir, ".jsgroup-cache");
        assert_eq!(config.resources.origin, "vendor");
        assert!(config.resources.libraries.is_empty());
        assert!(config.resources.engine.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
group = "aura"

[resources]
engine = "engine/engine"
"#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        // Overridden values
        assert_eq!(config.group, "aura");
        assert_eq!(config.resources.engine.as_deref(), Some("engine/engine"));
        // Default values preserved
        assert_eq!(config.start, "app.js");
        assert_eq!(config.resources.origin, "vendor");
    }

    #[test]
    fn parse_modes_by_kebab_case_name() {
        let toml = r#"
modes = ["development", "doc", "production-debug"]
"#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.modes,
            vec![
                GenerationMode::Development,
                GenerationMode::Doc,
                GenerationMode::ProductionDebug,
            ]
        );
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("jsgroup.toml")).unwrap();
        assert_eq!(config.group, "app");
        assert_eq!(config.dest, "dist");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jsgroup.toml");
        fs::write(
            &path,
            r#"
group = "widgets"
version = "2.1"
modes = ["production"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.group, "widgets");
        assert_eq!(config.version, "2.1");
        assert_eq!(config.modes, vec![GenerationMode::Production]);
        // Unspecified values should be defaults
        assert_eq!(config.source_root, "src-js");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jsgroup.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<BuildConfig, _> = toml::from_str(r#"grup = "app""#);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let toml = r#"
[resources]
cachedir = ".cache"
"#;
        let result: Result<BuildConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mode_rejected() {
        let result: Result<BuildConfig, _> = toml::from_str(r#"modes = ["turbo"]"#);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(BuildConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_group() {
        let mut config = BuildConfig::default();
        config.group = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("group"));
    }

    #[test]
    fn validate_empty_modes() {
        let mut config = BuildConfig::default();
        config.modes = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_duplicate_modes() {
        let mut config = BuildConfig::default();
        config.modes = vec![GenerationMode::Production, GenerationMode::Production];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jsgroup.toml");
        fs::write(&path, r#"modes = []"#).unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let content = stock_config_toml();
        let _: toml::Value = toml::from_str(content).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: BuildConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.group, "app");
        assert_eq!(config.dest, "dist");
        assert_eq!(config.resources.cache_dir, ".jsgroup-cache");
        assert_eq!(
            config.modes,
            vec![GenerationMode::Development, GenerationMode::Production]
        );
    }
}
