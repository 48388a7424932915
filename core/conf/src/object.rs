//! Data object storing the bridge's configuration.
use serde::Deserialize;
use serde::Serialize;

use super::RegistrationConf;
use super::ZookeeperConf;

/// Global configuration for the access-control bridge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Authorisation gateway configuration.
    #[serde(default)]
    pub auth: AuthConf,

    /// Service registration configuration.
    #[serde(default)]
    pub registration: RegistrationConf,

    /// Zookeeper coordination service configuration.
    #[serde(default)]
    pub zookeeper: ZookeeperConf,
}

/// Authorisation gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConf {
    /// Check requests with the policy-decision service.
    ///
    /// When disabled every authorisation check is allowed without contacting the service.
    #[serde(default = "AuthConf::default_enabled")]
    pub enabled: bool,
}

impl AuthConf {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for AuthConf {
    fn default() -> Self {
        AuthConf {
            enabled: Self::default_enabled(),
        }
    }
}
