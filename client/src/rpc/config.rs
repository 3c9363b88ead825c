//! Connection settings for a remote app

use std::time::Duration;

use tracing::debug;

use super::constants::{
    BRP_DEFAULT_HOST, BRP_HOST_ENV_VAR, BRP_HTTP_PROTOCOL, BRP_JSONRPC_PATH, BRP_PORT_ENV_VAR,
    CONNECTION_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use super::port::Port;
use crate::error::Result;

/// Where and how to reach the remote app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address
    pub host:            String,
    /// Validated port
    pub port:            Port,
    /// Upper bound for a whole request
    pub timeout:         Duration,
    /// Upper bound for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host:            BRP_DEFAULT_HOST.to_string(),
            port:            Port::default(),
            timeout:         Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Duration::from_secs(CONNECTION_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `BRP_HOST` and `BRP_PORT`
    ///
    /// An invalid `BRP_PORT` is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(BRP_HOST_ENV_VAR).filter(|host| !host.trim().is_empty()) {
            debug!("Using host from {BRP_HOST_ENV_VAR}: {host}");
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(BRP_PORT_ENV_VAR) {
            config.port = port.parse()?;
            debug!("Using port from {BRP_PORT_ENV_VAR}: {}", config.port);
        }
        Ok(config)
    }

    /// Same settings on another port
    #[must_use]
    pub const fn with_port(mut self, port: Port) -> Self {
        self.port = port;
        self
    }

    /// Same settings on another host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Same settings with another request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The JSON-RPC endpoint URL
    pub fn url(&self) -> String {
        format!(
            "{BRP_HTTP_PROTOCOL}://{}:{}{BRP_JSONRPC_PATH}",
            self.host, self.port
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_url() {
        assert_eq!(ClientConfig::default().url(), "http://127.0.0.1:15702/");
    }

    #[test]
    fn test_environment_overrides() {
        let config =
            ClientConfig::from_lookup(lookup(&[("BRP_HOST", "10.0.0.2"), ("BRP_PORT", "16000")]))
                .unwrap();
        assert_eq!(config.url(), "http://10.0.0.2:16000/");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[("BRP_PORT", "99")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("BRP_PORT", "nope")])).is_err());
    }

    #[test]
    fn test_blank_host_keeps_default() {
        let config = ClientConfig::from_lookup(lookup(&[("BRP_HOST", "  ")])).unwrap();
        assert_eq!(config.host, BRP_DEFAULT_HOST);
    }
}
