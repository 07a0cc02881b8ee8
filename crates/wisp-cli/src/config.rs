//! Optional `wisp.toml` overrides for the host-supplied [`wisp::ResourceLimits`]
//! (SPEC_FULL §B "Configuration"). Absent a config file, the REPL runs with
//! wisp's own defaults.

use serde::Deserialize;
use wisp::ResourceLimits;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitsConfig {
    pub max_depth: Option<usize>,
    pub max_steps: Option<u64>,
}

impl Config {
    /// Reads `path` if it exists; a missing file is not an error (spec's
    /// defaults apply), a malformed one is.
    pub fn load(path: &std::path::Path) -> Result<Config, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn resource_limits(&self) -> ResourceLimits {
        let defaults = ResourceLimits::default();
        ResourceLimits {
            max_depth: self.limits.max_depth.unwrap_or(defaults.max_depth),
            max_steps: self.limits.max_steps.unwrap_or(defaults.max_steps),
        }
    }
}
