// Connection configuration domain model
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDRESS: &str = "192.168.1.100";
pub const DEFAULT_LAN_PORT: &str = "8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionType {
    Lan,
    Cloud,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    #[serde(rename = "type")]
    pub kind: ConnectionType,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ConnectionConfig {
    #[cfg(test)]
    pub fn lan(address: impl Into<String>, port: Option<String>) -> Self {
        Self {
            kind: ConnectionType::Lan,
            address: address.into(),
            port,
            api_key: None,
        }
    }

    #[cfg(test)]
    pub fn cloud(address: impl Into<String>) -> Self {
        Self {
            kind: ConnectionType::Cloud,
            address: address.into(),
            port: None,
            api_key: None,
        }
    }

    /// Fill in the defaults the connection form would have shown.
    /// LAN links always carry a port, cloud links never do.
    pub fn normalized(self) -> Self {
        let address = match self.address.trim() {
            "" => DEFAULT_ADDRESS.to_string(),
            trimmed => trimmed.to_string(),
        };

        let port = match self.kind {
            ConnectionType::Lan => Some(
                self.port
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or(DEFAULT_LAN_PORT)
                    .to_string(),
            ),
            ConnectionType::Cloud => None,
        };

        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            kind: self.kind,
            address,
            port,
            api_key,
        }
    }

    /// Port to bind for LAN links.
    pub fn lan_port(&self) -> &str {
        self.port.as_deref().unwrap_or(DEFAULT_LAN_PORT)
    }
}
