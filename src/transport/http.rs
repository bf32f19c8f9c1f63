use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::domain::{Encoding, Method, ProviderUrl, TransportFailure};
use crate::transport::sanitize::{render_params, truncate_for_log};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One network call, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub url: String,
    pub method: Method,
    pub encoding: Encoding,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl HttpCall {
    /// Form-encoded POST, the provider protocol's only shape.
    pub fn post_form(
        url: impl Into<String>,
        params: Vec<(String, String)>,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            encoding: Encoding::Form,
            params,
            headers: Vec::new(),
            timeout,
            verify_tls: true,
        }
    }

    /// Body-less HEAD request.
    pub fn head(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            method: Method::Head,
            encoding: Encoding::Query,
            params: Vec::new(),
            headers: Vec::new(),
            timeout,
            verify_tls: true,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn insecure(mut self) -> Self {
        self.verify_tls = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs exactly one HTTP exchange. Implementations never retry.
pub trait HttpTransport: Send + Sync {
    fn execute<'a>(
        &'a self,
        call: &'a HttpCall,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>>;
}

/// [`HttpTransport`] backed by `reqwest`.
///
/// Holds a second client with certificate verification disabled for
/// reachability probes that ask for it. With `verify_tls` off both clients
/// accept invalid certificates.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    insecure_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: Option<&str>, verify_tls: bool) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(!verify_tls);
        let mut insecure = reqwest::Client::builder().danger_accept_invalid_certs(true);
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
            insecure = insecure.user_agent(user_agent);
        }
        Ok(Self {
            client: builder.build()?,
            insecure_client: insecure.build()?,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        call: &'a HttpCall,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
        Box::pin(async move {
            let client = if call.verify_tls {
                &self.client
            } else {
                &self.insecure_client
            };

            let mut request = match call.method {
                Method::Get => client.get(&call.url),
                Method::Post => client.post(&call.url),
                Method::Head => client.head(&call.url),
            };
            request = match call.encoding {
                Encoding::Form => request.form(&call.params),
                Encoding::Query => request.query(&call.params),
                Encoding::Json => request.json(&json_object(&call.params)),
            };
            for (name, value) in &call.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request
                .timeout(call.timeout)
                .send()
                .await
                .map_err(classify_reqwest_error)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(classify_reqwest_error)?;
            Ok(HttpResponse { status, body })
        })
    }
}

fn json_object(params: &[(String, String)]) -> serde_json::Map<String, serde_json::Value> {
    params
        .iter()
        .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
        .collect()
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportFailure {
    let (is_timeout, is_connect) = (err.is_timeout(), err.is_connect());
    let err = err.without_url();
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        chain.push_str(": ");
        chain.push_str(&inner.to_string());
        source = inner.source();
    }
    classify_error(is_timeout, is_connect, &scrub_urls(&chain))
}

/// Replace every `http(s)://...` token with `<url>`.
///
/// Keeps host and path words out of keyword matching, and query-encoded
/// credentials out of logs and `Unknown` messages.
fn scrub_urls(message: &str) -> String {
    let mut scrubbed = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(start) = ["http://", "https://"]
        .iter()
        .filter_map(|scheme| rest.find(scheme))
        .min()
    {
        scrubbed.push_str(&rest[..start]);
        scrubbed.push_str("<url>");
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| c.is_whitespace() || matches!(c, ')' | '"' | '\''))
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    scrubbed.push_str(rest);
    scrubbed
}

/// Map an error description to the failure taxonomy.
///
/// `chain` is the error message followed by all of its sources.
pub fn classify_error(is_timeout: bool, is_connect: bool, chain: &str) -> TransportFailure {
    let lower = chain.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

    if is_timeout || mentions(&["timed out", "timeout"]) {
        TransportFailure::Timeout
    } else if mentions(&[
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "no such host",
        "nodename nor servname",
    ]) {
        TransportFailure::Dns
    } else if mentions(&["certificate", "tls", "ssl", "handshake"]) {
        TransportFailure::Tls
    } else if is_connect || mentions(&["connection refused"]) {
        TransportFailure::ConnectionRefused
    } else if mentions(&[
        "connection reset",
        "connection closed",
        "incomplete message",
        "unexpected eof",
    ]) {
        TransportFailure::NoResponse
    } else {
        TransportFailure::Unknown(chain.to_owned())
    }
}

/// Validate the call's URL, then run it through `transport`, logging both ends.
///
/// Malformed URLs fail with [`TransportFailure::InvalidUrl`] before any network activity.
pub async fn send(
    transport: &dyn HttpTransport,
    label: &str,
    call: &HttpCall,
) -> Result<HttpResponse, TransportFailure> {
    if let Err(err) = ProviderUrl::parse(call.url.as_str()) {
        log::warn!("[{label}] rejected {}: {err}", call.method.as_str());
        return Err(TransportFailure::InvalidUrl(err.to_string()));
    }

    log::debug!("[{label}] {} {}", call.method.as_str(), call.url);
    if !call.params.is_empty() {
        log::debug!("[{label}] Request Params: {}", render_params(&call.params));
    }

    match transport.execute(call).await {
        Ok(response) => {
            log::debug!("[{label}] Response Status: {}", response.status);
            log::debug!(
                "[{label}] Response Body: {}",
                truncate_for_log(&response.body)
            );
            Ok(response)
        }
        Err(failure) => {
            log::warn!(
                "[{label}] {} {} failed: {} ({failure})",
                call.method.as_str(),
                call.url,
                failure.kind()
            );
            Err(failure)
        }
    }
}
