//! Transport layer: the single-call HTTP primitive and wire-format details.

mod actions;
mod http;
mod sanitize;

use std::time::Duration;

pub use actions::{
    encode_balance, encode_cancel, encode_multi_refill, encode_multi_refill_status,
    encode_multi_status, encode_order, encode_refill, encode_refill_status, encode_services,
    encode_status,
};
pub use http::{BoxFuture, HttpCall, HttpResponse, HttpTransport, ReqwestTransport, send};
pub use sanitize::preview;

use crate::domain::{ApiKey, ApiOutcome, ApiRequest};

/// Issue one provider request against `url` and classify the answer.
///
/// Never fails: every transport or protocol problem ends up in the outcome.
pub async fn call_provider(
    transport: &dyn HttpTransport,
    label: &str,
    url: &str,
    key: &ApiKey,
    request: &ApiRequest,
    timeout: Duration,
) -> ApiOutcome {
    let call = HttpCall {
        url: url.to_owned(),
        method: request.method,
        encoding: request.encoding,
        params: request.params(key),
        headers: Vec::new(),
        timeout,
        verify_tls: true,
    };

    let outcome = match send(transport, label, &call).await {
        Ok(response) => ApiOutcome::from_response(response.status, &response.body),
        Err(failure) => ApiOutcome::from(failure),
    };

    let action = request.action.map_or("-", |action| action.as_str());
    match &outcome {
        ApiOutcome::Success(_) => log::debug!("[{label}] action={action} -> success"),
        other => log::warn!(
            "[{label}] action={action} key={} -> {}",
            key.redacted(),
            other.label()
        ),
    }
    outcome
}
