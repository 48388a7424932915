//! Configuration of server registration with the coordination service.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Server registration configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConf {
    /// Path of the node advertising the server.
    #[serde(default = "RegistrationConf::default_path")]
    pub path: String,

    /// Interval, in seconds, between checks that the registration node still exists.
    ///
    /// Node deletions are also detected with watches: this is the fallback.
    /// Values below one second are raised to one second.
    #[serde(default = "RegistrationConf::default_watch_interval")]
    pub watch_interval: u64,
}

impl RegistrationConf {
    /// Shortest interval between registration node checks.
    pub const MIN_WATCH_INTERVAL: u64 = 1;

    /// Interval between registration node checks, never below [`Self::MIN_WATCH_INTERVAL`].
    pub fn watch_period(&self) -> Duration {
        Duration::from_secs(self.watch_interval.max(Self::MIN_WATCH_INTERVAL))
    }

    fn default_path() -> String {
        "/acbridge/servers".into()
    }

    fn default_watch_interval() -> u64 {
        30
    }
}

impl Default for RegistrationConf {
    fn default() -> Self {
        RegistrationConf {
            path: Self::default_path(),
            watch_interval: Self::default_watch_interval(),
        }
    }
}

/// Zookeeper coordination service configuration options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZookeeperConf {
    /// Zookeeper ensemble connection string.
    #[serde(default = "ZookeeperConf::default_ensemble")]
    pub ensemble: String,

    /// Zookeeper session timeout (in seconds).
    #[serde(default = "ZookeeperConf::default_timeout")]
    pub timeout: u64,
}

impl ZookeeperConf {
    fn default_ensemble() -> String {
        "localhost:2181".into()
    }

    fn default_timeout() -> u64 {
        10
    }
}

impl Default for ZookeeperConf {
    fn default() -> Self {
        ZookeeperConf {
            ensemble: Self::default_ensemble(),
            timeout: Self::default_timeout(),
        }
    }
}
