//! Client layer: maps provider actions onto transport calls.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::domain::{
    ApiKey, ApiOutcome, ApiRequest, OrderId, OrderParams, ProviderConfig, ProviderId, ProviderUrl,
    RefillId, TransportFailure, ValidationError,
};
use crate::manager::StoreError;
use crate::settings::DEFAULT_REQUEST_TIMEOUT;
use crate::transport::{self, HttpTransport, ReqwestTransport};

const DEFAULT_LABEL: &str = "smm";

#[derive(Debug, thiserror::Error)]
/// Errors surfaced by this crate.
///
/// Provider calls themselves never fail (see [`ApiOutcome`]); this type is what
/// [`ApiOutcome::into_result`] and the manager return for `?`-style callers.
pub enum SmmError {
    /// A domain constructor rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// DNS, TLS, timeout, refused connection, bad HTTP status, invalid URL.
    #[error("transport error: {0}")]
    Transport(#[from] TransportFailure),

    /// The provider answered with an `error` field.
    #[error("API error: {message}")]
    Api { message: String },

    #[error("empty response from provider")]
    EmptyResponse,

    #[error("provider not found: {id}")]
    ProviderNotFound { id: ProviderId },

    /// The external data store rejected a call.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] Box<dyn StdError + Send + Sync>),
}

impl ApiOutcome {
    /// Convert into a `Result`, keeping the payload on success.
    pub fn into_result(self) -> Result<Value, SmmError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::ProtocolError(message) => Err(SmmError::Api { message }),
            Self::Empty => Err(SmmError::EmptyResponse),
            Self::TransportError(failure) => Err(SmmError::Transport(failure)),
        }
    }
}

#[derive(Clone)]
/// Builder for [`SmmClient`].
pub struct SmmClientBuilder {
    url: ProviderUrl,
    key: ApiKey,
    label: String,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl SmmClientBuilder {
    pub fn new(url: ProviderUrl, key: ApiKey) -> Self {
        Self {
            url,
            key,
            label: DEFAULT_LABEL.to_owned(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
            transport: None,
        }
    }

    /// Name used as the log prefix, usually the provider's display name.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Per-call timeout (default 15s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the HTTP `User-Agent` header. Ignored with a custom transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use an existing transport instead of building a `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<SmmClient, SmmError> {
        let http = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(self.user_agent.as_deref(), true)
                    .map_err(|err| SmmError::Build(Box::new(err)))?,
            ),
        };

        Ok(SmmClient {
            label: self.label,
            url: self.url,
            key: self.key,
            timeout: self.timeout,
            http,
        })
    }
}

#[derive(Clone)]
/// Client for one SMM panel speaking the common `key` + `action` protocol.
///
/// Every method returns an [`ApiOutcome`] instead of failing, so callers can
/// render successes and failures uniformly.
pub struct SmmClient {
    label: String,
    url: ProviderUrl,
    key: ApiKey,
    timeout: Duration,
    http: Arc<dyn HttpTransport>,
}

impl SmmClient {
    /// Client with the default `reqwest` transport and timeout.
    pub fn new(url: ProviderUrl, key: ApiKey) -> Result<Self, SmmError> {
        Self::builder(url, key).build()
    }

    pub fn builder(url: ProviderUrl, key: ApiKey) -> SmmClientBuilder {
        SmmClientBuilder::new(url, key)
    }

    /// Client for a stored provider, sharing `http` with other clients.
    pub fn for_provider(
        provider: &ProviderConfig,
        http: Arc<dyn HttpTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            label: provider.name.clone(),
            url: provider.base_url.clone(),
            key: provider.key.clone(),
            timeout,
            http,
        }
    }

    pub fn url(&self) -> &ProviderUrl {
        &self.url
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Send an arbitrary request to the configured endpoint.
    pub async fn execute(&self, request: &ApiRequest) -> ApiOutcome {
        transport::call_provider(
            self.http.as_ref(),
            &self.label,
            self.url.as_str(),
            &self.key,
            request,
            self.timeout,
        )
        .await
    }

    /// Place an order (`action=add`).
    ///
    /// Which optional fields a service type requires is not checked here.
    pub async fn order(&self, params: &OrderParams) -> ApiOutcome {
        self.execute(&transport::encode_order(params)).await
    }

    pub async fn status(&self, order: &OrderId) -> ApiOutcome {
        self.execute(&transport::encode_status(order)).await
    }

    /// Status of several orders; ids are sent comma-joined in the given order.
    pub async fn multi_status(&self, orders: &[OrderId]) -> ApiOutcome {
        self.execute(&transport::encode_multi_status(orders)).await
    }

    /// Full service catalogue.
    pub async fn services(&self) -> ApiOutcome {
        self.execute(&transport::encode_services()).await
    }

    pub async fn refill(&self, order: &OrderId) -> ApiOutcome {
        self.execute(&transport::encode_refill(order)).await
    }

    pub async fn multi_refill(&self, orders: &[OrderId]) -> ApiOutcome {
        self.execute(&transport::encode_multi_refill(orders)).await
    }

    pub async fn refill_status(&self, refill: &RefillId) -> ApiOutcome {
        self.execute(&transport::encode_refill_status(refill)).await
    }

    pub async fn multi_refill_status(&self, refills: &[RefillId]) -> ApiOutcome {
        self.execute(&transport::encode_multi_refill_status(refills)).await
    }

    pub async fn cancel(&self, orders: &[OrderId]) -> ApiOutcome {
        self.execute(&transport::encode_cancel(orders)).await
    }

    pub async fn balance(&self) -> ApiOutcome {
        self.execute(&transport::encode_balance()).await
    }
}
