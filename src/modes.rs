//! Generation modes: the fixed set of build flavors a group can target.
//!
//! Each mode is one output artifact pair (`{group}_{suffix}.js` and
//! `{group}_{suffix}_compat.js`) with its own compression behavior. Modes are
//! configuration data — the set is fixed at compile time and nothing about a
//! mode changes at runtime.
//!
//! ## Mode Properties
//!
//! | Mode | Suffix | Production libs | Compression |
//! |------|--------|-----------------|-------------|
//! | `development` | `dev` | no (unminified) | passthrough |
//! | `testing` | `test` | no | passthrough |
//! | `stats` | `stats` | yes (minified) | passthrough |
//! | `doc` | `doc` | no | passthrough |
//! | `production` | `prod` | yes | minify |
//! | `production-debug` | `proddebug` | yes | passthrough |
//!
//! The "production libs" flag selects which variant of the auxiliary
//! libraries and engine text gets prepended/appended to the artifact:
//! minified for production-grade modes, readable for the rest.

use crate::compress::{Compressor, JsMinifier, Passthrough};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One target build flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    Development,
    Testing,
    Stats,
    Doc,
    Production,
    ProductionDebug,
}

/// All modes, in declaration order.
pub const ALL_MODES: &[GenerationMode] = &[
    GenerationMode::Development,
    GenerationMode::Testing,
    GenerationMode::Stats,
    GenerationMode::Doc,
    GenerationMode::Production,
    GenerationMode::ProductionDebug,
];

static MINIFIER: JsMinifier = JsMinifier;
static PASSTHROUGH: Passthrough = Passthrough;

impl GenerationMode {
    /// Filename suffix for this mode's artifacts.
    pub fn suffix(self) -> &'static str {
        match self {
            GenerationMode::Development => "dev",
            GenerationMode::Testing => "test",
            GenerationMode::Stats => "stats",
            GenerationMode::Doc => "doc",
            GenerationMode::Production => "prod",
            GenerationMode::ProductionDebug => "proddebug",
        }
    }

    /// Whether this mode ships in production builds. Selects the minified
    /// variants of the engine and external libraries.
    pub fn allowed_in_production(self) -> bool {
        matches!(
            self,
            GenerationMode::Stats | GenerationMode::Production | GenerationMode::ProductionDebug
        )
    }

    /// The compression backend for this mode's rendered source.
    ///
    /// Only `production` minifies; `production-debug` deliberately keeps the
    /// body readable so stack traces map back to source.
    pub fn compressor(self) -> &'static dyn Compressor {
        match self {
            GenerationMode::Production => &MINIFIER,
            _ => &PASSTHROUGH,
        }
    }

    /// Canonical uppercase name, used in directive mode sets and as the
    /// per-mode job identifier (`jsgen.<NAME>`).
    pub fn name(self) -> &'static str {
        match self {
            GenerationMode::Development => "DEVELOPMENT",
            GenerationMode::Testing => "TESTING",
            GenerationMode::Stats => "STATS",
            GenerationMode::Doc => "DOC",
            GenerationMode::Production => "PRODUCTION",
            GenerationMode::ProductionDebug => "PRODUCTIONDEBUG",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown generation mode: {}", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for GenerationMode {
    type Err = UnknownMode;

    /// Case-insensitive; `-` and `_` are ignored, so `production-debug`,
    /// `PRODUCTIONDEBUG` and `production_debug` all match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        ALL_MODES
            .iter()
            .copied()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_unique() {
        let mut suffixes: Vec<_> = ALL_MODES.iter().map(|m| m.suffix()).collect();
        suffixes.sort();
        suffixes.dedup();
        assert_eq!(suffixes.len(), ALL_MODES.len());
    }

    #[test]
    fn production_flag() {
        assert!(GenerationMode::Production.allowed_in_production());
        assert!(GenerationMode::ProductionDebug.allowed_in_production());
        assert!(GenerationMode::Stats.allowed_in_production());
        assert!(!GenerationMode::Development.allowed_in_production());
        assert!(!GenerationMode::Doc.allowed_in_production());
    }

    #[test]
    fn from_str_case_insensitive() {
        assert_eq!(
            "production".parse::<GenerationMode>().unwrap(),
            GenerationMode::Production
        );
        assert_eq!(
            "DEVELOPMENT".parse::<GenerationMode>().unwrap(),
            GenerationMode::Development
        );
    }

    #[test]
    fn from_str_ignores_separators() {
        assert_eq!(
            "production-debug".parse::<GenerationMode>().unwrap(),
            GenerationMode::ProductionDebug
        );
        assert_eq!(
            "production_debug".parse::<GenerationMode>().unwrap(),
            GenerationMode::ProductionDebug
        );
    }

    #[test]
    fn from_str_unknown() {
        let err = "release".parse::<GenerationMode>().unwrap_err();
        assert_eq!(err, UnknownMode("release".to_string()));
    }

    #[test]
    fn display_matches_name() {
        for mode in ALL_MODES {
            assert_eq!(format!("{}", mode), mode.name());
        }
    }

    #[test]
    fn serde_kebab_case() {
        let json = serde_json::to_string(&GenerationMode::ProductionDebug).unwrap();
        assert_eq!(json, "\"production-debug\"");
        let back: GenerationMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GenerationMode::ProductionDebug);
    }
}
