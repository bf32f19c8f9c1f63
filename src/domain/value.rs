use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;

/// Number of leading characters of a credential that may appear in logs.
const REDACTED_PREFIX_LEN: usize = 4;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Provider API credential.
///
/// Invariant: non-empty after trimming. `Debug` and [`ApiKey::redacted`] only
/// ever expose a short prefix.
pub struct ApiKey(String);

impl ApiKey {
    /// Canonical form field name carrying the credential (`key`).
    pub const FIELD: &'static str = "key";

    /// Create a validated [`ApiKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the full credential. Never log the returned value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering: a short prefix followed by `***`.
    ///
    /// Keys too short to spare a prefix are fully masked.
    pub fn redacted(&self) -> String {
        redact(&self.0)
    }
}

pub(crate) fn redact(secret: &str) -> String {
    if secret.chars().count() < REDACTED_PREFIX_LEN * 2 {
        return "***".to_owned();
    }
    let prefix: String = secret.chars().take(REDACTED_PREFIX_LEN).collect();
    format!("{prefix}***")
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.redacted()).finish()
    }
}

impl TryFrom<String> for ApiKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(value: ApiKey) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Absolute `http`/`https` URL of a provider API endpoint.
///
/// The trimmed input is kept verbatim (no normalisation), so path variants built
/// from it stay predictable.
pub struct ProviderUrl(String);

impl ProviderUrl {
    /// Field name used in validation errors.
    pub const FIELD: &'static str = "url";

    /// Validate that `value` is a syntactically absolute `http(s)://host...` URL.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let invalid = |reason| ValidationError::InvalidUrl {
            input: trimmed.to_owned(),
            reason,
        };
        let parsed = url::Url::parse(trimmed).map_err(|err| match err {
            url::ParseError::RelativeUrlWithoutBase => invalid("missing http(s) scheme"),
            url::ParseError::EmptyHost => invalid("missing host"),
            _ => invalid("malformed url"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("missing http(s) scheme"));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the URL as provided (trimmed).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host component, e.g. `panel.example.com`.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
    }
}

impl fmt::Display for ProviderUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProviderUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProviderUrl> for String {
    fn from(value: ProviderUrl) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Row id of a provider in the external store.
///
/// Invariant: non-empty after trimming.
pub struct ProviderId(String);

impl ProviderId {
    pub const FIELD: &'static str = "provider_id";

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProviderId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.0
    }
}

/// Identifiers that travel in comma-joined wire lists.
///
/// Invariant: non-empty after trimming, no commas or whitespace inside.
macro_rules! list_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Form field name used by the provider protocol.
            pub const FIELD: &'static str = $field;

            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: Self::FIELD });
                }
                if trimmed.contains(|c: char| c == ',' || c.is_whitespace()) {
                    return Err(ValidationError::InvalidId {
                        field: Self::FIELD,
                        input: trimmed.to_owned(),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

list_id!(
    /// Provider-side order id (`order`).
    OrderId,
    "order"
);
list_id!(
    /// Provider-side refill id (`refill`).
    RefillId,
    "refill"
);
list_id!(
    /// Provider catalogue service id (`service`).
    ServiceId,
    "service"
);

pub(crate) fn join_ids<T: fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
