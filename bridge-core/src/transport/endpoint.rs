// transport/endpoint.rs

use bridge_common::errors::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::fmt;
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 18812;

/// Where the terminal's RPC server listens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port`, `ws://host:port` or a bare host (default port).
    pub fn parse(raw: &str) -> BridgeResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BridgeError::Connection("empty endpoint".into()));
        }
        let rest = match raw.split_once("://") {
            None => raw,
            Some(("ws", rest)) => rest,
            Some((scheme, _)) => {
                return Err(BridgeError::Connection(format!(
                    "unsupported scheme {:?} in {:?}",
                    scheme, raw
                )))
            }
        };
        // Non-special scheme, so an explicit :80 is not folded away as a default.
        let url = Url::parse(&format!("mt5://{}", rest))
            .map_err(|e| BridgeError::Connection(format!("invalid endpoint {:?}: {}", raw, e)))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BridgeError::Connection(format!("no host in {:?}", raw)))?;
        let endpoint = Self::new(host, url.port().unwrap_or(DEFAULT_PORT));
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Rejects endpoints that cannot be dialed at all.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.port == 0 {
            return Err(BridgeError::Connection(format!("port 0 on {}", self.host)));
        }
        self.to_url().map(|_| ())
    }

    pub fn to_url(&self) -> BridgeResult<Url> {
        if self.host.trim().is_empty() || self.host.contains(char::is_whitespace) {
            return Err(BridgeError::Connection(format!("invalid host {:?}", self.host)));
        }
        Url::parse(&format!("ws://{}:{}", self.host, self.port))
            .map_err(|e| BridgeError::Connection(format!("invalid endpoint {}: {}", self, e)))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Endpoint::parse("mt5-host:9000").unwrap(), Endpoint::new("mt5-host", 9000));
        assert_eq!(Endpoint::parse("ws://10.0.0.5:18812").unwrap(), Endpoint::new("10.0.0.5", 18812));
        assert_eq!(Endpoint::parse("localhost").unwrap(), Endpoint::default());
    }

    #[test]
    fn test_malformed_is_connection_error() {
        for raw in ["", "http://host:1", "host:notaport", "host:0", "ws://:80"] {
            assert!(
                matches!(Endpoint::parse(raw), Err(BridgeError::Connection(_))),
                "{raw} should be rejected"
            );
        }
        assert!(Endpoint::new("bad host", 1).validate().is_err());
    }

    #[test]
    fn test_url() {
        let url = Endpoint::new("127.0.0.1", 18812).to_url().unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:18812/");
    }
}
