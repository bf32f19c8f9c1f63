//! Server-side settings for the integration layer.
//!
//! Everything is passed explicitly; nothing here reads the process environment.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::client::SmmError;
use crate::transport::{HttpTransport, ReqwestTransport};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CORS_PROXY: &str = "https://cors-anywhere.herokuapp.com/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Timeout of a regular provider call.
    pub request_timeout_secs: u64,
    /// Timeout of a reachability probe.
    pub probe_timeout_secs: u64,
    /// Timeout of each troubleshooting attempt.
    pub attempt_timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Certificate verification for regular provider calls. Probes never verify.
    pub verify_tls: bool,
    /// Prefix prepended to a target URL to route a probe through a CORS proxy.
    pub cors_proxy: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT.as_secs(),
            user_agent: None,
            verify_tls: true,
            cors_proxy: DEFAULT_CORS_PROXY.to_owned(),
        }
    }
}

impl ServerSettings {
    /// Parse a JSON settings document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    /// Build the shared `reqwest`-backed transport.
    pub fn build_transport(&self) -> Result<Arc<dyn HttpTransport>, SmmError> {
        let transport = ReqwestTransport::new(self.user_agent.as_deref(), self.verify_tls)
            .map_err(|err| SmmError::Build(Box::new(err)))?;
        Ok(Arc::new(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timeouts() {
        let settings = ServerSettings::default();
        assert_eq!(settings.request_timeout(), Duration::from_secs(15));
        assert_eq!(settings.probe_timeout(), Duration::from_secs(10));
        assert_eq!(settings.attempt_timeout(), Duration::from_secs(5));
        assert_eq!(settings.cors_proxy, DEFAULT_CORS_PROXY);
        assert!(settings.verify_tls);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            ServerSettings::from_json(r#"{"attempt_timeout_secs": 2, "user_agent": "panel/1.0"}"#)
                .unwrap();
        assert_eq!(settings.attempt_timeout(), Duration::from_secs(2));
        assert_eq!(settings.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(settings.user_agent.as_deref(), Some("panel/1.0"));
        assert!(settings.verify_tls);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(ServerSettings::from_json(r#"{"probe_timeout_secs": "ten"}"#).is_err());
    }
}
