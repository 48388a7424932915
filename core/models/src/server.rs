use serde::Deserialize;
use serde::Serialize;

/// Address and metadata a server advertises through service registration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Hostname of the machine the server runs on.
    #[serde(default)]
    pub hostname: String,

    /// Address the server listens on.
    pub ip: String,

    /// Process ID of the server.
    #[serde(default)]
    pub pid: u32,

    /// Port the server listens on.
    pub port: u16,

    /// Address other services should use to reach the server.
    pub register_ip: String,

    /// URL scheme used to reach the server (`http` or `https`).
    #[serde(default = "ServerInfo::default_scheme")]
    pub scheme: String,

    /// Unique ID of the server instance.
    pub uuid: String,

    /// Version of the server software.
    #[serde(default)]
    pub version: String,
}

impl ServerInfo {
    /// Placeholder address that can never be advertised to other services.
    pub const UNROUTABLE_ADDRESS: &'static str = "0.0.0.0";

    fn default_scheme() -> String {
        "http".into()
    }

    /// Check if the advertised address can be used by other services.
    pub fn routable(&self) -> bool {
        self.register_ip != Self::UNROUTABLE_ADDRESS
    }
}

#[cfg(test)]
mod tests {
    use super::ServerInfo;

    #[test]
    fn decode_with_defaults() {
        let info: ServerInfo = serde_json::from_value(serde_json::json!({
            "ip": "0.0.0.0",
            "port": 8080,
            "register_ip": "10.0.0.1",
            "uuid": "abc",
        }))
        .unwrap();
        assert_eq!(info.scheme, "http");
        assert!(info.routable());
    }

    #[test]
    fn unroutable_register_ip() {
        let info: ServerInfo = serde_json::from_value(serde_json::json!({
            "ip": "10.0.0.1",
            "port": 8080,
            "register_ip": "0.0.0.0",
            "uuid": "abc",
        }))
        .unwrap();
        assert!(!info.routable());
    }
}
