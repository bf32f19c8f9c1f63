use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::diagnostics::network::NetworkTester;
use crate::domain::{
    Action, ApiKey, ApiOutcome, ApiRequest, AppliedFix, DiagnosticResult, KeyField,
    TransportFailure, WorkingFormat,
};
use crate::settings::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, ServerSettings};
use crate::transport::{self, HttpTransport, preview};

const LABEL: &str = "troubleshoot";

/// Keys shorter than this are almost certainly truncated.
const MIN_KEY_LEN: usize = 10;

/// Path rewrite applied to the (repaired) base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlVariant {
    Original,
    Append(&'static str),
    /// `/v2` ↔ `/v1` in the path.
    SwapVersion,
    /// Drop everything from `/api` on, then append `/api/v2`.
    RebaseOnApiV2,
}

impl UrlVariant {
    /// `None` when the variant does not apply to `base`.
    pub fn apply(self, base: &str) -> Option<String> {
        let (origin, path) = split_origin(base);
        match self {
            Self::Original => Some(base.to_owned()),
            Self::Append(suffix) => Some(format!("{base}{suffix}")),
            Self::SwapVersion => {
                if path.contains("/v2") {
                    Some(format!("{origin}{}", path.replacen("/v2", "/v1", 1)))
                } else if path.contains("/v1") {
                    Some(format!("{origin}{}", path.replacen("/v1", "/v2", 1)))
                } else {
                    None
                }
            }
            Self::RebaseOnApiV2 => {
                let kept = path.find("/api").map_or(path, |idx| &path[..idx]);
                Some(format!("{origin}{kept}/api/v2"))
            }
        }
    }
}

/// Enumeration order is priority order: the first accepted combination wins.
///
/// Variants that yield the same URL are tried once, so the number of attempts
/// is at most `URL_VARIANTS.len() * PARAM_SHAPES.len()`.
pub const URL_VARIANTS: [UrlVariant; 6] = [
    UrlVariant::Original,
    UrlVariant::Append("/api/v2"),
    UrlVariant::Append("/api/v1"),
    UrlVariant::Append("/api"),
    UrlVariant::SwapVersion,
    UrlVariant::RebaseOnApiV2,
];

/// Credential field name + action tried against every URL variant, in order.
pub const PARAM_SHAPES: [(KeyField, Option<Action>); 7] = [
    (KeyField::Key, Some(Action::Balance)),
    (KeyField::Key, Some(Action::Services)),
    (KeyField::ApiKey, Some(Action::Balance)),
    (KeyField::ApiKey, Some(Action::Services)),
    (KeyField::ApiToken, Some(Action::Balance)),
    (KeyField::ApiToken, Some(Action::Services)),
    (KeyField::Key, None),
];

/// Every request format to try for `base`, URL-major. Repeated URLs are tried once.
pub fn candidate_formats(base: &str) -> Vec<WorkingFormat> {
    let mut urls: Vec<String> = Vec::with_capacity(URL_VARIANTS.len());
    for url in URL_VARIANTS.iter().filter_map(|variant| variant.apply(base)) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    urls.into_iter()
        .flat_map(|url| {
            PARAM_SHAPES.iter().map(move |&(key_field, action)| WorkingFormat {
                url: url.clone(),
                key_field,
                action,
            })
        })
        .collect()
}

/// Try candidates in order and stop at the first outcome `accept` approves.
///
/// On exhaustion returns the last observed error message, if any attempt ran.
pub async fn first_accepted<T, F, Fut>(
    candidates: impl IntoIterator<Item = T>,
    accept: fn(&ApiOutcome) -> bool,
    mut attempt: F,
) -> Result<(T, Value), Option<String>>
where
    T: Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ApiOutcome>,
{
    let mut last_error = None;
    for candidate in candidates {
        let outcome = attempt(candidate.clone()).await;
        if accept(&outcome) {
            let payload = outcome.payload().cloned().unwrap_or(Value::Null);
            return Ok((candidate, payload));
        }
        last_error = Some(outcome.error_message().unwrap_or_else(|| {
            let shape = outcome.payload().map(Value::to_string).unwrap_or_default();
            format!("unrecognized response: {}", preview(&shape, 80))
        }));
    }
    Err(last_error)
}

/// URL after the cheap syntactic fixes, with a note per fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRepair {
    pub url: String,
    pub changes: Vec<String>,
}

pub fn repair_url(input: &str) -> UrlRepair {
    let mut url = input.trim().to_owned();
    let mut changes = Vec::new();

    if !has_http_scheme(&url) {
        url = format!("https://{url}");
        changes.push("Added https:// to the URL".to_owned());
    }
    if url.ends_with('/') {
        url = url.trim_end_matches('/').to_owned();
        changes.push("Removed the trailing slash from the URL".to_owned());
    }

    UrlRepair { url, changes }
}

/// Static hints derived from the URL and key text alone. Order is stable.
pub fn suggest_fixes(url: &str, key: &str) -> Vec<String> {
    let url = url.trim();
    let mut suggestions = Vec::new();

    if !has_http_scheme(url) {
        suggestions.push("Add https:// to the beginning of the API URL.".to_owned());
    }
    if url.ends_with('/') {
        suggestions.push("Remove the trailing slash from the API URL.".to_owned());
    }

    let (_, path) = split_origin(url);
    if !path.contains("/api") {
        suggestions
            .push("Most SMM panels expose the API under /api/v2; try adding it to the URL.".to_owned());
    } else if !path.contains("/api/v") {
        suggestions.push("Add an API version to the path, e.g. /api/v2.".to_owned());
    }

    if key.trim().chars().count() < MIN_KEY_LEN {
        suggestions.push(
            "The API key looks too short; copy the full key from the provider dashboard.".to_owned(),
        );
    }
    if key.chars().any(char::is_whitespace) {
        suggestions.push("Remove spaces or line breaks from the API key.".to_owned());
    }

    suggestions
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Split `https://host/path` into `("https://host", "/path")`.
fn split_origin(url: &str) -> (&str, &str) {
    let host_start = url.find("://").map_or(0, |idx| idx + 3);
    match url[host_start..].find('/') {
        Some(idx) => url.split_at(host_start + idx),
        None => (url, ""),
    }
}

/// Brute-force recovery for providers that deviate from the common API shape.
pub struct Troubleshooter {
    http: Arc<dyn HttpTransport>,
    request_timeout: Duration,
    attempt_timeout: Duration,
    network: NetworkTester,
}

impl Troubleshooter {
    pub fn new(http: Arc<dyn HttpTransport>) -> Self {
        Self {
            network: NetworkTester::new(Arc::clone(&http)),
            http,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &ServerSettings, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            network: NetworkTester::from_settings(settings, Arc::clone(&http)),
            http,
            request_timeout: settings.request_timeout(),
            attempt_timeout: settings.attempt_timeout(),
        }
    }

    /// The canonical `{key, action: balance}` call.
    pub async fn test_direct(&self, url: &str, key: &ApiKey) -> ApiOutcome {
        transport::call_provider(
            self.http.as_ref(),
            LABEL,
            url,
            key,
            &ApiRequest::new(Action::Balance),
            self.request_timeout,
        )
        .await
    }

    /// Walk URL variants × param shapes until one yields a plausible answer.
    pub async fn try_alternative_formats(&self, url: &str, key: &ApiKey) -> DiagnosticResult {
        let candidates = candidate_formats(url);
        log::info!(
            "[{LABEL}] trying {} request formats for {url}",
            candidates.len()
        );

        let found = first_accepted(candidates, ApiOutcome::is_relaxed_success, |format| {
            self.attempt(format, key)
        })
        .await;

        match found {
            Ok((format, _)) => {
                let description = describe_format(&format);
                log::info!("[{LABEL}] working format: {description}");
                DiagnosticResult::ok(format!("Found a working request format: {description}"))
                    .with_fix(AppliedFix {
                        description,
                        format: Some(format),
                    })
            }
            Err(last_error) => DiagnosticResult::failed(format!(
                "No working request format found. Last error: {}",
                last_error.unwrap_or_else(|| "none".to_owned())
            )),
        }
    }

    async fn attempt(&self, format: WorkingFormat, key: &ApiKey) -> ApiOutcome {
        let request = match format.action {
            Some(action) => ApiRequest::new(action).with_key_field(format.key_field),
            None => ApiRequest::bare(format.key_field),
        };
        transport::call_provider(
            self.http.as_ref(),
            LABEL,
            &format.url,
            key,
            &request,
            self.attempt_timeout,
        )
        .await
    }

    /// Full recovery flow: repair the URL, try it directly, then enumerate
    /// alternatives, and finally attach a network diagnosis.
    pub async fn troubleshoot(&self, url: &str, key: &str) -> DiagnosticResult {
        let mut suggestions = suggest_fixes(url, key);
        let key = match ApiKey::new(key) {
            Ok(key) => key,
            Err(err) => {
                let mut result = DiagnosticResult::failed(format!("Invalid API key: {err}"));
                result.suggestions = suggestions;
                return result;
            }
        };

        let repair = repair_url(url);
        let url_fix = (!repair.changes.is_empty()).then(|| AppliedFix {
            description: repair.changes.join("; "),
            format: None,
        });

        let direct = self.test_direct(&repair.url, &key).await;
        if direct.confirms_balance() {
            let mut result = DiagnosticResult::ok(balance_message(&direct));
            result.fix = url_fix;
            return result;
        }
        if let ApiOutcome::TransportError(failure @ TransportFailure::InvalidUrl(_)) = &direct {
            let mut result = DiagnosticResult::failed(failure.to_string());
            result.suggestions = suggestions;
            return result;
        }

        let alternative = self.try_alternative_formats(&repair.url, &key).await;
        if alternative.success {
            return match url_fix {
                Some(url_fix) => {
                    let mut result = alternative;
                    if let Some(fix) = result.fix.as_mut() {
                        fix.description = format!("{}; {}", url_fix.description, fix.description);
                    }
                    result
                }
                None => alternative,
            };
        }

        let network = self.network.diagnose(&repair.url).await;
        for hint in network.suggestions {
            if !suggestions.contains(&hint) {
                suggestions.push(hint);
            }
        }
        let mut result = DiagnosticResult::failed(format!(
            "{} Network check: {}",
            alternative.message, network.message
        ));
        result.details = network.details;
        result.fix = url_fix;
        result.suggestions = suggestions;
        result
    }
}

fn describe_format(format: &WorkingFormat) -> String {
    match format.action {
        Some(action) => format!(
            "{} with `{}` and action={}",
            format.url,
            format.key_field.as_str(),
            action.as_str()
        ),
        None => format!("{} with `{}` only", format.url, format.key_field.as_str()),
    }
}

fn balance_message(outcome: &ApiOutcome) -> String {
    let balance = outcome
        .payload()
        .and_then(|payload| payload.get("balance"))
        .map(|balance| match balance {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
    match balance {
        Some(balance) => format!("Connection successful. Balance: {balance}"),
        None => "Connection successful.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{FakeTransport, Reply, param};

    use super::*;

    const BASE: &str = "https://panel.example.com";
    const KEY: &str = "abcdef0123456789";

    fn key() -> ApiKey {
        ApiKey::new(KEY).unwrap()
    }

    #[test]
    fn url_variants_follow_the_documented_order() {
        let base = "https://panel.example.com/api/v2";
        let urls: Vec<_> = URL_VARIANTS
            .iter()
            .map(|variant| variant.apply(base))
            .collect();
        assert_eq!(
            urls,
            vec![
                Some("https://panel.example.com/api/v2".to_owned()),
                Some("https://panel.example.com/api/v2/api/v2".to_owned()),
                Some("https://panel.example.com/api/v2/api/v1".to_owned()),
                Some("https://panel.example.com/api/v2/api".to_owned()),
                Some("https://panel.example.com/api/v1".to_owned()),
                Some("https://panel.example.com/api/v2".to_owned()),
            ]
        );
    }

    #[test]
    fn swap_version_goes_both_ways() {
        assert_eq!(
            UrlVariant::SwapVersion
                .apply("https://panel.example.com/api/v1")
                .as_deref(),
            Some("https://panel.example.com/api/v2")
        );
        assert_eq!(
            UrlVariant::SwapVersion
                .apply("https://panel.example.com/api/v2")
                .as_deref(),
            Some("https://panel.example.com/api/v1")
        );
    }

    #[test]
    fn host_names_containing_api_are_left_alone() {
        let base = "https://api.example.com";
        assert_eq!(UrlVariant::SwapVersion.apply(base), None);
        assert_eq!(
            UrlVariant::RebaseOnApiV2.apply(base).as_deref(),
            Some("https://api.example.com/api/v2")
        );
        assert_eq!(
            UrlVariant::RebaseOnApiV2
                .apply("https://api.example.com/api/v1/")
                .as_deref(),
            Some("https://api.example.com/api/v2")
        );
    }

    #[test]
    fn candidates_are_url_major_and_deduplicated() {
        let candidates = candidate_formats(BASE);
        // original, /api/v2, /api/v1, /api; swap does not apply, rebase repeats /api/v2
        assert_eq!(candidates.len(), 4 * PARAM_SHAPES.len());
        assert_eq!(candidates[0].url, BASE);
        assert_eq!(candidates[0].key_field, KeyField::Key);
        assert_eq!(candidates[0].action, Some(Action::Balance));
        assert_eq!(candidates[6].action, None);
        assert_eq!(candidates[7].url, "https://panel.example.com/api/v2");
        assert_eq!(candidates[7].key_field, KeyField::Key);
    }

    #[test]
    fn repair_adds_scheme_and_strips_slash() {
        let repair = repair_url(" panel.example.com/api/v2/ ");
        assert_eq!(repair.url, "https://panel.example.com/api/v2");
        assert_eq!(repair.changes.len(), 2);

        let untouched = repair_url("http://panel.example.com/api/v2");
        assert_eq!(untouched.url, "http://panel.example.com/api/v2");
        assert!(untouched.changes.is_empty());
    }

    #[test]
    fn suggest_fixes_for_bare_host_and_short_key() {
        assert_eq!(
            suggest_fixes("api.example.com", "short"),
            vec![
                "Add https:// to the beginning of the API URL.".to_owned(),
                "Most SMM panels expose the API under /api/v2; try adding it to the URL."
                    .to_owned(),
                "The API key looks too short; copy the full key from the provider dashboard."
                    .to_owned(),
            ]
        );
    }

    #[test]
    fn suggest_fixes_other_shapes() {
        assert_eq!(
            suggest_fixes("https://panel.example.com/api/", "abcdef 0123456789"),
            vec![
                "Remove the trailing slash from the API URL.".to_owned(),
                "Add an API version to the path, e.g. /api/v2.".to_owned(),
                "Remove spaces or line breaks from the API key.".to_owned(),
            ]
        );
        assert!(suggest_fixes("https://panel.example.com/api/v2", KEY).is_empty());
    }

    #[tokio::test]
    async fn enumeration_stops_at_first_match() {
        let target = "https://panel.example.com/api/v2";
        let transport = FakeTransport::replying(r#"{"error":"Invalid API key"}"#).on(
            target,
            "api_key",
            KEY,
            Reply::json(r#"{"balance":"3.50","currency":"USD"}"#),
        );
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter.try_alternative_formats(BASE, &key()).await;
        assert!(result.success);
        // 7 shapes on the original URL, then key/balance, key/services, api_key/balance
        assert_eq!(transport.calls().len(), 10);

        let call = transport.last_call();
        assert_eq!(call.url, target);
        assert_eq!(call.timeout, Duration::from_secs(5));
        assert_eq!(param(&call, "api_key"), Some(KEY));
        assert_eq!(param(&call, "action"), Some("balance"));

        let fix = result.fix.unwrap();
        assert_eq!(
            fix.format,
            Some(WorkingFormat {
                url: target.to_owned(),
                key_field: KeyField::ApiKey,
                action: Some(Action::Balance),
            })
        );
    }

    #[tokio::test]
    async fn exhausted_enumeration_reports_last_error() {
        let transport = FakeTransport::replying(r#"{"error":"Invalid API key"}"#);
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter.try_alternative_formats(BASE, &key()).await;
        assert!(!result.success);
        assert!(result.message.contains("Invalid API key"));
        assert_eq!(transport.calls().len(), candidate_formats(BASE).len());
    }

    #[tokio::test]
    async fn direct_success_short_circuits() {
        let transport = FakeTransport::replying(r#"{"balance":"12.00","currency":"USD"}"#);
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter
            .troubleshoot("panel.example.com/api/v2/", KEY)
            .await;
        assert!(result.success);
        assert_eq!(result.message, "Connection successful. Balance: 12.00");
        assert!(result.fix_applied());
        assert_eq!(transport.calls().len(), 1);

        let call = transport.last_call();
        assert_eq!(call.url, "https://panel.example.com/api/v2");
        assert_eq!(call.timeout, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn relaxed_shapes_do_not_satisfy_the_direct_probe() {
        // A services listing passes the relaxed check but not the balance check.
        let transport = FakeTransport::replying(r#"[{"service":1}]"#);
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter.troubleshoot(BASE, KEY).await;
        assert!(result.success);
        assert_eq!(transport.calls().len(), 2);
        assert!(result.fix.is_some_and(|fix| fix.format.is_some()));
    }

    #[tokio::test]
    async fn total_failure_attaches_network_diagnosis() {
        let transport = FakeTransport::failing(TransportFailure::Dns);
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter.troubleshoot(BASE, KEY).await;
        assert!(!result.success);
        assert!(result.details.is_some_and(|details| details.dns));
        assert!(result.message.contains("DNS"));
        assert!(
            result
                .suggestions
                .iter()
                .any(|hint| hint.contains("domain name"))
        );
    }

    #[tokio::test]
    async fn empty_key_is_rejected_without_calls() {
        let transport = FakeTransport::replying("{}");
        let troubleshooter = Troubleshooter::new(transport.arc());

        let result = troubleshooter.troubleshoot(BASE, "  ").await;
        assert!(!result.success);
        assert!(result.message.starts_with("Invalid API key"));
        assert!(transport.calls().is_empty());
    }
}
