use serde::Serialize;
use serde_json::Value;

use crate::domain::request::{Action, KeyField};

/// Why a single transport call produced no usable HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// Rejected before any network activity.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("DNS resolution failed")]
    Dns,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("request timed out")]
    Timeout,

    #[error("TLS handshake failed")]
    Tls,

    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16 },

    #[error("no response received")]
    NoResponse,

    #[error("{0}")]
    Unknown(String),
}

impl TransportFailure {
    /// `false` for input problems that no retry could fix.
    pub fn is_network(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid-url",
            Self::Dns => "dns-failure",
            Self::ConnectionRefused => "connection-refused",
            Self::Timeout => "timeout",
            Self::Tls => "tls-failure",
            Self::HttpStatus { .. } => "http-error",
            Self::NoResponse => "no-response",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Classified result of one provider call.
///
/// Provider payloads are arbitrary JSON; every heuristic over their shape lives
/// here instead of at the call sites.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Success(Value),
    /// The provider answered with an `error` field.
    ProtocolError(String),
    /// `null`, `{}` or a blank body.
    Empty,
    TransportError(TransportFailure),
}

impl ApiOutcome {
    /// Classify a raw HTTP answer.
    ///
    /// Bodies that are not JSON are kept as a JSON string and therefore count
    /// as success: a 200 with a malformed but non-empty body is a known false
    /// positive.
    pub fn from_response(status: u16, body: &str) -> Self {
        let payload = decode_body(body);

        if let Some(message) = error_message(&payload) {
            return Self::ProtocolError(message);
        }
        if !(200..=299).contains(&status) {
            return Self::TransportError(TransportFailure::HttpStatus { status });
        }
        if is_empty_payload(&payload) {
            return Self::Empty;
        }
        Self::Success(payload)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// Human-readable failure message; `None` on success.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::ProtocolError(message) => Some(message.clone()),
            Self::Empty => Some("empty response from provider".to_owned()),
            Self::TransportError(failure) => Some(failure.to_string()),
        }
    }

    /// Shape of the outcome for logs, never the payload itself.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ProtocolError(_) => "error",
            Self::Empty => "empty",
            Self::TransportError(failure) => failure.kind(),
        }
    }

    /// Strict check used for the direct balance probe: a `balance` field or
    /// `success: true`.
    pub fn confirms_balance(&self) -> bool {
        self.payload().is_some_and(|payload| {
            payload.get("balance").is_some() || payload.get("success") == Some(&Value::Bool(true))
        })
    }

    /// Relaxed check used while enumerating alternative request formats.
    ///
    /// Best effort only: any non-empty object without an `error` field passes,
    /// so `{"status": "error"}` is accepted.
    pub fn is_relaxed_success(&self) -> bool {
        if self.confirms_balance() {
            return true;
        }
        match self.payload() {
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
            _ => false,
        }
    }

    /// Uniform shape for UI rendering: the payload on success, otherwise
    /// `{"success": false, "error": message}`.
    pub fn to_ui_value(&self) -> Value {
        match self {
            Self::Success(payload) => payload.clone(),
            other => serde_json::json!({
                "success": false,
                "error": other.error_message().unwrap_or_default(),
            }),
        }
    }
}

impl From<TransportFailure> for ApiOutcome {
    fn from(value: TransportFailure) -> Self {
        Self::TransportError(value)
    }
}

fn decode_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_owned()))
}

fn error_message(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// Network problems detected by a reachability probe. All `false` means healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NetworkDetails {
    /// Host name did not resolve.
    pub dns: bool,
    /// TCP connection could not be established.
    pub connection: bool,
    pub timeout: bool,
    /// TLS handshake or certificate problem.
    pub ssl: bool,
    /// Requests are likely blocked by a proxy, firewall or cross-origin policy.
    pub proxy: bool,
}

impl NetworkDetails {
    pub fn from_failure(failure: &TransportFailure) -> Self {
        let mut details = Self::default();
        match failure {
            TransportFailure::Dns => details.dns = true,
            TransportFailure::ConnectionRefused | TransportFailure::Unknown(_) => {
                details.connection = true;
            }
            TransportFailure::Timeout => {
                details.timeout = true;
                details.connection = true;
            }
            TransportFailure::Tls => details.ssl = true,
            TransportFailure::NoResponse => {
                details.connection = true;
                details.proxy = true;
            }
            TransportFailure::InvalidUrl(_) | TransportFailure::HttpStatus { .. } => {}
        }
        details
    }

    pub fn is_healthy(&self) -> bool {
        *self == Self::default()
    }
}

/// Request shape that a provider accepted during troubleshooting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingFormat {
    pub url: String,
    pub key_field: KeyField,
    pub action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub description: String,
    pub format: Option<WorkingFormat>,
}

/// Outcome of a diagnostic run, ready to surface to an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticResult {
    pub success: bool,
    pub message: String,
    pub details: Option<NetworkDetails>,
    pub fix: Option<AppliedFix>,
    pub suggestions: Vec<String>,
}

impl DiagnosticResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: None,
            fix: None,
            suggestions: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::ok(message)
        }
    }

    pub fn with_details(mut self, details: NetworkDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_fix(mut self, fix: AppliedFix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn fix_applied(&self) -> bool {
        self.fix.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_field_wins_over_everything() {
        assert_eq!(
            ApiOutcome::from_response(200, r#"{"error":"bad key"}"#),
            ApiOutcome::ProtocolError("bad key".to_owned())
        );
        assert_eq!(
            ApiOutcome::from_response(401, r#"{"error":"Incorrect request"}"#),
            ApiOutcome::ProtocolError("Incorrect request".to_owned())
        );
    }

    #[test]
    fn non_string_error_is_rendered_as_json() {
        assert_eq!(
            ApiOutcome::from_response(200, r#"{"error":{"code":3}}"#),
            ApiOutcome::ProtocolError(r#"{"code":3}"#.to_owned())
        );
        assert!(ApiOutcome::from_response(200, r#"{"error":null,"balance":"1"}"#).is_success());
    }

    #[test]
    fn empty_shapes_classify_as_empty() {
        assert_eq!(ApiOutcome::from_response(200, "{}"), ApiOutcome::Empty);
        assert_eq!(ApiOutcome::from_response(200, "null"), ApiOutcome::Empty);
        assert_eq!(ApiOutcome::from_response(200, "  "), ApiOutcome::Empty);
    }

    #[test]
    fn empty_array_is_a_valid_answer() {
        assert_eq!(
            ApiOutcome::from_response(200, "[]"),
            ApiOutcome::Success(json!([]))
        );
    }

    #[test]
    fn non_success_status_without_error_field_is_http_error() {
        assert_eq!(
            ApiOutcome::from_response(502, "<html>bad gateway</html>"),
            ApiOutcome::TransportError(TransportFailure::HttpStatus { status: 502 })
        );
    }

    #[test]
    fn non_json_body_is_accepted_as_success() {
        assert_eq!(
            ApiOutcome::from_response(200, "OK"),
            ApiOutcome::Success(json!("OK"))
        );
    }

    #[test]
    fn strict_and_relaxed_predicates() {
        let balance = ApiOutcome::Success(json!({"balance": "10.5", "currency": "USD"}));
        assert!(balance.confirms_balance());

        let flagged = ApiOutcome::Success(json!({"success": true}));
        assert!(flagged.confirms_balance());

        let listing = ApiOutcome::Success(json!([{"service": 1}]));
        assert!(!listing.confirms_balance());
        assert!(listing.is_relaxed_success());

        let odd = ApiOutcome::Success(json!({"status": "error"}));
        assert!(odd.is_relaxed_success());

        assert!(!ApiOutcome::Success(json!([])).is_relaxed_success());
        assert!(!ApiOutcome::Success(json!("OK")).is_relaxed_success());
        assert!(!ApiOutcome::ProtocolError("x".to_owned()).is_relaxed_success());
    }

    #[test]
    fn ui_value_has_uniform_failure_shape() {
        let value = ApiOutcome::TransportError(TransportFailure::Timeout).to_ui_value();
        assert_eq!(
            value,
            json!({"success": false, "error": "request timed out"})
        );
    }

    #[test]
    fn network_details_follow_failure_kind() {
        let details = NetworkDetails::from_failure(&TransportFailure::Timeout);
        assert!(details.timeout && details.connection);
        assert!(!details.dns && !details.ssl && !details.proxy);

        assert!(NetworkDetails::from_failure(&TransportFailure::Dns).dns);
        assert!(NetworkDetails::from_failure(&TransportFailure::NoResponse).proxy);
        assert!(NetworkDetails::default().is_healthy());
    }
}
