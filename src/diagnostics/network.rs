use std::sync::Arc;
use std::time::Duration;

use crate::domain::{DiagnosticResult, NetworkDetails, ProviderUrl, TransportFailure};
use crate::settings::{DEFAULT_CORS_PROXY, DEFAULT_PROBE_TIMEOUT, ServerSettings};
use crate::transport::{self, HttpCall, HttpTransport};

const LABEL: &str = "network-test";

/// Reachability probe that knows nothing about the SMM protocol.
pub struct NetworkTester {
    http: Arc<dyn HttpTransport>,
    timeout: Duration,
    cors_proxy: String,
}

impl NetworkTester {
    pub fn new(http: Arc<dyn HttpTransport>) -> Self {
        Self {
            http,
            timeout: DEFAULT_PROBE_TIMEOUT,
            cors_proxy: DEFAULT_CORS_PROXY.to_owned(),
        }
    }

    pub fn from_settings(settings: &ServerSettings, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            http,
            timeout: settings.probe_timeout(),
            cors_proxy: settings.cors_proxy.clone(),
        }
    }

    /// HEAD the URL with certificate checks off. Any HTTP answer counts as reachable.
    pub async fn test_connection(&self, url: &str) -> DiagnosticResult {
        let host = match ProviderUrl::parse(url).map(|url| url.host()) {
            Ok(Some(host)) => host,
            Ok(None) => return DiagnosticResult::failed("Invalid URL: missing host"),
            Err(err) => return DiagnosticResult::failed(format!("Invalid URL: {err}")),
        };

        let call = HttpCall::head(url, self.timeout).insecure();
        match transport::send(self.http.as_ref(), LABEL, &call).await {
            Ok(response) => DiagnosticResult::ok(format!(
                "Connected to {host} (HTTP {}). DNS, connection and SSL are working.",
                response.status
            ))
            .with_details(NetworkDetails::default()),
            Err(failure) => {
                let details = NetworkDetails::from_failure(&failure);
                let mut result = DiagnosticResult::failed(self.describe(&host, &failure))
                    .with_details(details);
                result.suggestions = suggestions_for(&details);
                result
            }
        }
    }

    /// Repeat the reachability check through the CORS proxy.
    ///
    /// Success here with a failing direct probe means the target is up but
    /// refuses browser-originated or cross-origin requests.
    pub async fn test_with_proxy(&self, url: &str) -> DiagnosticResult {
        if let Err(err) = ProviderUrl::parse(url) {
            return DiagnosticResult::failed(format!("Invalid URL: {err}"));
        }

        let proxied = format!("{}{url}", self.cors_proxy);
        let call = HttpCall::head(proxied, self.timeout).header("X-Requested-With", "XMLHttpRequest");
        match transport::send(self.http.as_ref(), LABEL, &call).await {
            Ok(response) => DiagnosticResult::ok(format!(
                "Reachable through the CORS proxy (HTTP {}).",
                response.status
            )),
            Err(failure) => {
                DiagnosticResult::failed(format!("Not reachable through the CORS proxy: {failure}"))
            }
        }
    }

    /// Direct probe, falling back to the proxy probe when the direct one fails.
    pub async fn diagnose(&self, url: &str) -> DiagnosticResult {
        let direct = self.test_connection(url).await;
        let Some(mut details) = direct.details else {
            return direct;
        };
        if direct.success {
            return direct;
        }

        let proxied = self.test_with_proxy(url).await;
        if !proxied.success {
            return direct;
        }

        details.proxy = true;
        let mut result = DiagnosticResult::failed(format!(
            "{} The server answers through a proxy, so direct requests are being blocked.",
            direct.message
        ))
        .with_details(details);
        result.suggestions = suggestions_for(&details);
        result
    }

    fn describe(&self, host: &str, failure: &TransportFailure) -> String {
        match failure {
            TransportFailure::Dns => format!("DNS lookup failed for {host}."),
            TransportFailure::ConnectionRefused => format!("Connection to {host} was refused."),
            TransportFailure::Timeout => format!(
                "Connection to {host} timed out after {}s.",
                self.timeout.as_secs()
            ),
            TransportFailure::Tls => format!("SSL/TLS handshake with {host} failed."),
            TransportFailure::NoResponse => format!("No response received from {host}."),
            TransportFailure::HttpStatus { status } => format!("{host} answered HTTP {status}."),
            TransportFailure::InvalidUrl(message) => format!("Invalid URL: {message}"),
            TransportFailure::Unknown(message) => {
                format!("Connection to {host} failed: {message}")
            }
        }
    }
}

/// Remediation hints for a probe result, most fundamental problem first.
pub fn suggestions_for(details: &NetworkDetails) -> Vec<String> {
    if details.is_healthy() {
        return vec!["The server is reachable; check the API path and key instead.".to_owned()];
    }

    let mut suggestions = Vec::new();
    if details.dns {
        suggestions.push("Check that the domain name is spelled correctly.".to_owned());
        suggestions.push("Verify that the domain resolves, e.g. with another DNS resolver.".to_owned());
    }
    if details.connection && !details.timeout {
        suggestions.push(
            "Make sure the server is online and accepting connections on this port.".to_owned(),
        );
    }
    if details.timeout {
        suggestions.push(
            "The server is slow or unreachable; retry later or check firewall rules.".to_owned(),
        );
    }
    if details.ssl {
        suggestions.push(
            "The SSL certificate may be invalid or expired; try http:// or contact the provider."
                .to_owned(),
        );
    }
    if details.proxy {
        suggestions.push(
            "Requests may be blocked by CORS or a firewall; route calls through a server-side proxy."
                .to_owned(),
        );
    }
    suggestions
}
