use serde::Serialize;

use crate::domain::validation::ValidationError;
use crate::domain::value::{ApiKey, ServiceId};

/// Provider protocol verb sent in the `action` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Status,
    Services,
    Refill,
    RefillStatus,
    Cancel,
    Balance,
}

impl Action {
    pub const FIELD: &'static str = "action";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Status => "status",
            Self::Services => "services",
            Self::Refill => "refill",
            Self::RefillStatus => "refill_status",
            Self::Cancel => "cancel",
            Self::Balance => "balance",
        }
    }
}

/// Name of the form field that carries the credential.
///
/// Most panels use `key`; some forks expect `api_key` or `api_token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    #[default]
    Key,
    ApiKey,
    ApiToken,
}

impl KeyField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => ApiKey::FIELD,
            Self::ApiKey => "api_key",
            Self::ApiToken => "api_token",
        }
    }
}

/// How request fields are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// `application/x-www-form-urlencoded` body.
    #[default]
    Form,
    /// URL query string.
    Query,
    /// JSON object body.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    Get,
    #[default]
    Post,
    Head,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
        }
    }
}

/// One provider call, before the credential is attached.
///
/// Transient: built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub action: Option<Action>,
    pub key_field: KeyField,
    pub fields: Vec<(String, String)>,
    pub encoding: Encoding,
    pub method: Method,
}

impl ApiRequest {
    /// Canonical form-encoded POST with `key` + `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action: Some(action),
            key_field: KeyField::Key,
            fields: Vec::new(),
            encoding: Encoding::Form,
            method: Method::Post,
        }
    }

    /// POST carrying only the credential under `key_field`, no `action`.
    pub fn bare(key_field: KeyField) -> Self {
        Self {
            action: None,
            key_field,
            fields: Vec::new(),
            encoding: Encoding::Form,
            method: Method::Post,
        }
    }

    pub fn with_key_field(mut self, key_field: KeyField) -> Self {
        self.key_field = key_field;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Wire params in send order: credential, action, then action-specific fields.
    pub fn params(&self, key: &ApiKey) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.fields.len() + 2);
        params.push((self.key_field.as_str().to_owned(), key.as_str().to_owned()));
        if let Some(action) = self.action {
            params.push((Action::FIELD.to_owned(), action.as_str().to_owned()));
        }
        params.extend(self.fields.iter().cloned());
        params
    }
}

/// Optional order fields. Which ones a service type requires is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderOptions {
    pub quantity: Option<u64>,
    /// Custom comments, one per line.
    pub comments: Option<String>,
    /// Drip-feed runs.
    pub runs: Option<u32>,
    /// Drip-feed interval in minutes.
    pub interval: Option<u32>,
    pub keywords: Option<String>,
    pub hashtag: Option<String>,
    pub username: Option<String>,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub posts: Option<u32>,
    pub old_posts: Option<u32>,
    pub delay: Option<u32>,
    /// Subscription expiry, `d/m/Y`.
    pub expiry: Option<String>,
    pub answer_number: Option<String>,
}

/// Parameters of an `add` (place order) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderParams {
    service: ServiceId,
    link: String,
    options: OrderOptions,
}

impl OrderParams {
    pub const LINK_FIELD: &'static str = "link";

    pub fn new(
        service: ServiceId,
        link: impl Into<String>,
        options: OrderOptions,
    ) -> Result<Self, ValidationError> {
        let link = link.into();
        let trimmed = link.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: Self::LINK_FIELD,
            });
        }
        Ok(Self {
            service,
            link: trimmed.to_owned(),
            options,
        })
    }

    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn options(&self) -> &OrderOptions {
        &self.options
    }
}
