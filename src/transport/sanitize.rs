//! Log sanitization: keeps credentials and large bodies out of debug logs.

use crate::domain::redact;

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Param names whose values are credentials.
const SECRET_FIELDS: &[&str] = &["key", "api_key", "api_token", "secret", "api_secret"];

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging, noting the original length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_owned()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// First `limit` characters of `s`, with `...` appended when cut.
pub fn preview(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_owned(),
    }
}

/// Render request params as `a=1&key=abcd***` with credentials redacted.
pub fn render_params(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            if SECRET_FIELDS.contains(&name.as_str()) {
                format!("{name}={}", redact(value))
            } else {
                format!("{name}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
