//! Typed client configuration entries and the frpc TOML formatter
//!
//! The document uses frpc's native field names (`serverAddr`, `localIP`,
//! `secretKey`, ...) so a generated file is directly consumable by the
//! external client binary.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Top-level client configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub server_addr: String,
    pub server_port: u16,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<ProxyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visitors: Vec<VisitorEntry>,
}

/// Authentication section (`auth.method` / `auth.token`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default = "default_auth_method")]
    pub method: String,
    #[serde(default)]
    pub token: String,
}

fn default_auth_method() -> String {
    "token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: default_auth_method(),
            token: String::new(),
        }
    }
}

/// Transport type for a proxy or visitor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Tcp,
    Udp,
    Stcp,
    Xtcp,
}

/// A `[[proxies]]` entry exposing a local service through the server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxyEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "localIP", default, skip_serializing_if = "String::is_empty")]
    pub local_ip: String,
    #[serde(rename = "localPort", default, skip_serializing_if = "is_zero")]
    pub local_port: u16,
    #[serde(rename = "remotePort", default, skip_serializing_if = "is_zero")]
    pub remote_port: u16,
    #[serde(rename = "secretKey", default, skip_serializing_if = "String::is_empty")]
    pub secret_key: String,
}

/// A `[[visitors]]` entry reaching a secret proxy published elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisitorEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "serverName")]
    pub server_name: String,
    #[serde(rename = "secretKey", default, skip_serializing_if = "String::is_empty")]
    pub secret_key: String,
    #[serde(rename = "bindAddr", default, skip_serializing_if = "String::is_empty")]
    pub bind_addr: String,
    #[serde(rename = "bindPort", default, skip_serializing_if = "is_zero")]
    pub bind_port: u16,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

impl ClientConfig {
    pub fn new(server_addr: impl Into<String>, server_port: u16, token: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            server_port,
            auth: AuthConfig {
                method: default_auth_method(),
                token: token.into(),
            },
            proxies: Vec::new(),
            visitors: Vec::new(),
        }
    }

    /// Render the document as frpc-native TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse a TOML document back into the typed form.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check the fields the client binary cannot operate without.
    pub fn validate(&self) -> Result<()> {
        if self.server_addr.is_empty() {
            return Err(Error::validation("server address cannot be empty"));
        }
        if self.server_port == 0 {
            return Err(Error::validation("server port cannot be 0"));
        }
        for p in &self.proxies {
            if p.name.is_empty() {
                return Err(Error::validation("proxy entry name cannot be empty"));
            }
        }
        for v in &self.visitors {
            if v.name.is_empty() {
                return Err(Error::validation("visitor entry name cannot be empty"));
            }
            if v.server_name.is_empty() {
                return Err(Error::validation(format!(
                    "visitor '{}' must name the proxy it connects to",
                    v.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientConfig {
        let mut config = ClientConfig::new("203.0.113.5", 7000, "secret");
        config.visitors.push(VisitorEntry {
            name: "ssh-visitor".to_string(),
            kind: EntryKind::Stcp,
            server_name: "ssh".to_string(),
            secret_key: "abc".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            bind_port: 2222,
        });
        config
    }

    #[test]
    fn test_serializes_frpc_field_names() {
        let toml = sample().to_toml_string().unwrap();
        assert!(toml.contains("serverAddr = \"203.0.113.5\""));
        assert!(toml.contains("serverPort = 7000"));
        assert!(toml.contains("token = \"secret\""));
        assert!(toml.contains("[[visitors]]"));
        assert!(toml.contains("serverName = \"ssh\""));
        assert!(toml.contains("bindAddr = \"127.0.0.1\""));
        assert!(toml.contains("bindPort = 2222"));
        assert!(toml.contains("type = \"stcp\""));
    }

    #[test]
    fn test_parse_roundtrip() {
        let toml = sample().to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed.server_addr, "203.0.113.5");
        assert_eq!(parsed.server_port, 7000);
        assert_eq!(parsed.auth.token, "secret");
        assert_eq!(parsed.visitors.len(), 1);
        assert_eq!(parsed.visitors[0].kind, EntryKind::Stcp);
        assert_eq!(parsed.visitors[0].bind_port, 2222);
    }

    #[test]
    fn test_auth_defaults() {
        let parsed =
            ClientConfig::from_toml_str("serverAddr = \"example.com\"\nserverPort = 7000\n")
                .unwrap();
        assert_eq!(parsed.auth.method, "token");
        assert!(parsed.auth.token.is_empty());
        assert!(parsed.proxies.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut bad = sample();
        bad.server_addr.clear();
        assert!(bad.validate().is_err());

        let mut bad = sample();
        bad.server_port = 0;
        assert!(bad.validate().is_err());

        let mut bad = sample();
        bad.visitors[0].server_name.clear();
        assert!(bad.validate().is_err());
    }
}
