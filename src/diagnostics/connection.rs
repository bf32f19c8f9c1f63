use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    Action, ApiKey, ApiOutcome, ApiRequest, DiagnosticResult, NetworkDetails, TransportFailure,
};
use crate::settings::DEFAULT_REQUEST_TIMEOUT;
use crate::transport::{self, HttpTransport, preview};

/// Characters of the response shown back to the operator on success.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Untested,
    /// Terminal; the tester does not run again.
    Finished(DiagnosticResult),
}

/// One-shot protocol-level check of a provider URL + key.
///
/// Sends a single `services` call (or `balance`, see [`ConnectionTester::probe`])
/// and classifies the answer as success, provider error or empty.
pub struct ConnectionTester {
    url: String,
    key: ApiKey,
    action: Action,
    timeout: Duration,
    http: Arc<dyn HttpTransport>,
    state: ConnectionState,
}

impl ConnectionTester {
    pub fn new(url: impl Into<String>, key: ApiKey, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            url: url.into(),
            key,
            action: Action::Services,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            http,
            state: ConnectionState::Untested,
        }
    }

    /// Action used for the probe; `balance` is the cheaper troubleshooting variant.
    pub fn probe(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Run the probe once; later calls return the recorded result.
    pub async fn run(&mut self) -> DiagnosticResult {
        if let ConnectionState::Finished(result) = &self.state {
            return result.clone();
        }

        let outcome = transport::call_provider(
            self.http.as_ref(),
            "connection-test",
            &self.url,
            &self.key,
            &ApiRequest::new(self.action),
            self.timeout,
        )
        .await;
        let result = classify_probe(&outcome);
        self.state = ConnectionState::Finished(result.clone());
        result
    }
}

/// Three-way classification of a probe answer.
///
/// A provider answering 200 with a malformed but non-empty body passes.
pub fn classify_probe(outcome: &ApiOutcome) -> DiagnosticResult {
    match outcome {
        ApiOutcome::Success(payload) => DiagnosticResult::ok(format!(
            "Connection successful. Response: {}",
            preview(&payload.to_string(), PREVIEW_CHARS)
        )),
        ApiOutcome::ProtocolError(message) => DiagnosticResult::failed(format!("Error: {message}")),
        ApiOutcome::Empty => DiagnosticResult::failed(
            "No response received from the API. Check the URL and API key.",
        ),
        ApiOutcome::TransportError(failure @ TransportFailure::InvalidUrl(_)) => {
            DiagnosticResult::failed(format!("Connection failed: {failure}"))
        }
        ApiOutcome::TransportError(failure) => {
            DiagnosticResult::failed(format!("Connection failed: {failure}"))
                .with_details(NetworkDetails::from_failure(failure))
        }
    }
}
