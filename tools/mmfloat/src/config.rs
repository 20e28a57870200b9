//! Invoker configuration.
//!
//! Every setting has a built-in default. A TOML file named with `--config`
//! can override how the helper is launched; segment bases, the sentinel and
//! the write tolerance are fixed and not configurable.
//!
//! The file decides which program runs as root, so it is only read from a
//! path the caller names. Nothing is picked up from the working directory.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::verbose::vprintln;

/// Single-word memory access helper.
pub const HELPER_PROGRAM: &str = "mmio-word";

/// Program used to run the helper with superuser rights.
pub const ELEVATE_PROGRAM: &str = "sudo";

/// Upper bound on one helper invocation.
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest difference between requested and echoed value that counts as a clean write.
pub const WRITE_TOLERANCE: f64 = 1e-5;

/// On-disk layout of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    helper: Option<HelperSection>,
}

/// `[helper]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HelperSection {
    /// Path or name of the helper binary.
    program: Option<String>,
    /// Elevation wrapper; an empty string runs the helper directly.
    elevate: Option<String>,
    /// Invocation timeout in milliseconds.
    #[serde(rename = "timeout-ms")]
    timeout_ms: Option<u64>,
}

/// Resolved settings for launching the helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Helper binary.
    pub helper: String,
    /// Elevation wrapper placed in front of the helper, if any.
    pub elevate: Option<String>,
    /// Invocation timeout.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            helper: HELPER_PROGRAM.into(),
            elevate: Some(ELEVATE_PROGRAM.into()),
            timeout: HELPER_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or use the defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            vprintln!("config: built-in defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        vprintln!("config: {}", path.display());
        Ok(config)
    }

    /// Parse configuration text, filling unset keys with defaults.
    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let helper = file.helper.unwrap_or_default();
        let defaults = Self::default();

        let elevate = match helper.elevate {
            Some(e) if e.trim().is_empty() => None,
            Some(e) => Some(e),
            None => defaults.elevate,
        };

        Ok(Self {
            helper: helper.program.unwrap_or(defaults.helper),
            elevate,
            timeout: helper
                .timeout_ms
                .map_or(defaults.timeout, Duration::from_millis),
        })
    }
}
