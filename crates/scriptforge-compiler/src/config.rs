/// Build configuration switches

use std::fmt;
use std::str::FromStr;

/// Environment variable that selects the build mode.
pub const BUILD_MODE_ENV: &str = "SCRIPTFORGE_BUILD_MODE";

/// How compiled output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Debug info, module written to disk
    Debug,
    /// No debug info, module kept in memory only
    Release,
}

impl BuildMode {
    pub fn include_debug_info(self) -> bool {
        matches!(self, BuildMode::Debug)
    }

    pub fn in_memory(self) -> bool {
        matches!(self, BuildMode::Release)
    }

    /// Read the mode from `SCRIPTFORGE_BUILD_MODE`, falling back to the
    /// profile this crate was built with.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(BUILD_MODE_ENV).ok().as_deref())
    }

    /// Interpret a raw `SCRIPTFORGE_BUILD_MODE` value
    pub fn from_env_value(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };

        value.parse::<Self>().unwrap_or_else(|e| {
            let fallback = Self::default();
            tracing::warn!("Ignoring {}: {}; using {} build", BUILD_MODE_ENV, e, fallback);
            fallback
        })
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            other => Err(format!("unknown build mode '{}' (expected 'debug' or 'release')", other)),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => f.write_str("debug"),
            BuildMode::Release => f.write_str("release"),
        }
    }
}

/// Which modules end up in the backend's reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Only the modules currently loaded by the host runtime
    LoadedOnly,
    /// Loaded modules plus the index modules exporting an imported namespace
    #[default]
    LoadedAndMatched,
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loaded" | "loaded-only" => Ok(ReferencePolicy::LoadedOnly),
            "matched" | "loaded-and-matched" => Ok(ReferencePolicy::LoadedAndMatched),
            other => Err(format!("unknown reference policy '{}' (expected 'loaded' or 'matched')", other)),
        }
    }
}
