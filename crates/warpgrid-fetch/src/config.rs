//! FetchConfig — executor settings.
//!
//! Holds the default request timeout and the outgoing body chunk size. Built
//! in code with the builder methods, or parsed from the `[fetch]` table of a
//! TOML file:
//!
//! ```toml
//! [fetch]
//! default_timeout = "30s"   # "500ms", "2m", "10" (seconds); "0" disables
//! chunk_size = 100
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::body::DEFAULT_CHUNK_SIZE;

/// Settings threaded into [`RequestExecutor`](crate::RequestExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Timeout for requests that do not set their own (default: none).
    pub default_timeout: Option<Duration>,
    /// Bytes read from a request body source per host pull (default: 100).
    pub chunk_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// On-disk form of the `[fetch]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchSection {
    pub default_timeout: Option<String>,
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FetchFile {
    fetch: Option<FetchSection>,
}

impl FetchConfig {
    /// Builder method: set the default timeout. Zero means no default.
    pub fn with_default_timeout(self, timeout: Duration) -> Self {
        Self {
            default_timeout: (!timeout.is_zero()).then_some(timeout),
            ..self
        }
    }

    /// Builder method: set the outgoing chunk size.
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self { chunk_size, ..self }
    }

    /// Build from a parsed `[fetch]` table, filling gaps with defaults.
    pub fn from_section(section: &FetchSection) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = &section.default_timeout {
            let timeout = parse_duration(raw)
                .ok_or_else(|| anyhow::anyhow!("invalid default_timeout: {raw:?}"))?;
            config = config.with_default_timeout(timeout);
        }
        if let Some(chunk_size) = section.chunk_size {
            anyhow::ensure!(chunk_size > 0, "chunk_size must be > 0");
            config.chunk_size = chunk_size;
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: FetchFile = toml::from_str(content)?;
        Self::from_section(&file.fetch.unwrap_or_default())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
