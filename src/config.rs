//! Configuration types for ifsc-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for [`IfscCrawler`](crate::IfscCrawler)
///
/// Every field has a sensible default; `Config::default()` is a working
/// configuration pointed at the public IFSC results API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the results API (default: the public IFSC host)
    ///
    /// Overridable so tests and mirrors can point the crawler elsewhere.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of concurrently in-flight remote calls (default: 20)
    ///
    /// This single ceiling is shared by every fetch at every tree depth;
    /// there is no per-level limit.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Interval between progress snapshot emissions (default: 1 second)
    #[serde(default = "default_progress_interval", with = "duration_serde")]
    pub progress_interval: Duration,

    /// How a league whose events fetch failed is represented in its season
    #[serde(default)]
    pub failed_league_policy: FailedLeaguePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            progress_interval: default_progress_interval(),
            failed_league_policy: FailedLeaguePolicy::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the concurrency ceiling is zero or the
    /// base URL cannot be parsed.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency", "must be at least 1"));
        }
        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(Error::config(
                "base_url",
                format!("invalid URL {:?}: {e}", self.base_url),
            ));
        }
        Ok(())
    }
}

/// Representation of a league whose events fetch failed
///
/// The season's league sequence always keeps the same length and order as
/// the API index listing; this policy only decides what fills a failed slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedLeaguePolicy {
    /// Keep the slot as a league with its index-listing fields and an
    /// empty event sequence (default)
    #[default]
    Placeholder,
    /// Record an explicit null in the slot
    Null,
}

fn default_base_url() -> String {
    "https://components.ifsc-climbing.org".to_string()
}

fn default_concurrency() -> usize {
    20
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(1)
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
