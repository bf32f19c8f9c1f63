//! Multi-provider aggregation and routing over the external provider store.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::client::{SmmClient, SmmError};
use crate::diagnostics::ConnectionTester;
use crate::domain::{
    ApiOutcome, DiagnosticResult, NewProvider, OrderId, OrderParams, ProviderConfig, ProviderId,
};
use crate::settings::ServerSettings;
use crate::transport::HttpTransport;

/// Opaque failure reported by the external data store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Row access to the `service_providers` collection.
///
/// Implemented by the host application on top of its database client.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>, StoreError>;

    async fn get_provider(&self, id: &ProviderId) -> Result<Option<ProviderConfig>, StoreError>;

    /// Persist a new row; the store assigns the id.
    async fn insert_provider(&self, provider: NewProvider) -> Result<ProviderConfig, StoreError>;

    async fn update_provider(&self, provider: &ProviderConfig)
    -> Result<ProviderConfig, StoreError>;

    async fn delete_provider(&self, id: &ProviderId) -> Result<(), StoreError>;
}

/// Per-provider results of a fan-out call, keyed by provider display name.
pub type FanOut = BTreeMap<String, Result<Value, SmmError>>;

/// Aggregates the configured providers and routes calls to them by id.
///
/// The active providers are cached on first use and only re-read on an
/// explicit [`ServiceManager::load_providers`].
pub struct ServiceManager {
    store: Arc<dyn ProviderStore>,
    http: Arc<dyn HttpTransport>,
    timeout: Duration,
    providers: Option<Vec<ProviderConfig>>,
}

impl ServiceManager {
    pub fn new(
        store: Arc<dyn ProviderStore>,
        http: Arc<dyn HttpTransport>,
        settings: &ServerSettings,
    ) -> Self {
        Self {
            store,
            http,
            timeout: settings.request_timeout(),
            providers: None,
        }
    }

    /// (Re)load active providers from the store.
    pub async fn load_providers(&mut self) -> Result<&[ProviderConfig], SmmError> {
        let rows = self.store.list_providers().await?;
        let active: Vec<_> = rows.into_iter().filter(ProviderConfig::is_active).collect();
        log::info!("loaded {} active providers", active.len());
        Ok(self.providers.insert(active))
    }

    /// Cached providers; empty until loaded.
    pub fn providers(&self) -> &[ProviderConfig] {
        self.providers.as_deref().unwrap_or_default()
    }

    async fn ensure_loaded(&mut self) -> Result<(), SmmError> {
        if self.providers.is_none() {
            self.load_providers().await?;
        }
        Ok(())
    }

    fn client_for(&self, provider: &ProviderConfig) -> SmmClient {
        SmmClient::for_provider(provider, Arc::clone(&self.http), self.timeout)
    }

    /// Service catalogue of every active provider.
    ///
    /// A failing provider is reported under its own key and never hides the
    /// others; only a store failure fails the whole call.
    pub async fn get_all_services(&mut self) -> Result<FanOut, SmmError> {
        self.fan_out(|client| async move { client.services().await })
            .await
    }

    /// Balance of every active provider, isolated like [`Self::get_all_services`].
    pub async fn get_balances(&mut self) -> Result<FanOut, SmmError> {
        self.fan_out(|client| async move { client.balance().await })
            .await
    }

    async fn fan_out<F, Fut>(&mut self, call: F) -> Result<FanOut, SmmError>
    where
        F: Fn(SmmClient) -> Fut,
        Fut: Future<Output = ApiOutcome>,
    {
        self.ensure_loaded().await?;

        let calls = self.providers().iter().map(|provider| {
            let name = provider.name.clone();
            let pending = call(self.client_for(provider));
            async move { (name, pending.await) }
        });

        let mut results = FanOut::new();
        for (name, outcome) in join_all(calls).await {
            if let Some(message) = outcome.error_message() {
                log::warn!("[{name}] fan-out call failed: {message}");
            }
            results.insert(name, outcome.into_result());
        }
        Ok(results)
    }

    /// Persist a provider; the cache only grows once the store accepted it.
    pub async fn add_provider(&mut self, provider: NewProvider) -> Result<ProviderConfig, SmmError> {
        let created = self.store.insert_provider(provider).await?;
        log::info!("added provider {} ({})", created.name, created.id);
        if let Some(cache) = self.providers.as_mut() {
            if created.is_active() {
                cache.push(created.clone());
            }
        }
        Ok(created)
    }

    pub async fn update_provider(
        &mut self,
        provider: &ProviderConfig,
    ) -> Result<ProviderConfig, SmmError> {
        let updated = self.store.update_provider(provider).await?;
        if let Some(cache) = self.providers.as_mut() {
            cache.retain(|cached| cached.id != updated.id);
            if updated.is_active() {
                cache.push(updated.clone());
            }
        }
        Ok(updated)
    }

    pub async fn remove_provider(&mut self, id: &ProviderId) -> Result<(), SmmError> {
        self.store.delete_provider(id).await?;
        if let Some(cache) = self.providers.as_mut() {
            cache.retain(|cached| &cached.id != id);
        }
        log::info!("removed provider {id}");
        Ok(())
    }

    /// Cache first, then a direct store lookup.
    pub async fn resolve_provider(&self, id: &ProviderId) -> Result<ProviderConfig, SmmError> {
        if let Some(provider) = self.providers().iter().find(|provider| &provider.id == id) {
            return Ok(provider.clone());
        }
        self.store
            .get_provider(id)
            .await?
            .ok_or_else(|| SmmError::ProviderNotFound { id: id.clone() })
    }

    pub async fn place_order(
        &self,
        id: &ProviderId,
        params: &OrderParams,
    ) -> Result<Value, SmmError> {
        let provider = self.resolve_provider(id).await?;
        self.client_for(&provider).order(params).await.into_result()
    }

    pub async fn check_order_status(
        &self,
        id: &ProviderId,
        order: &OrderId,
    ) -> Result<Value, SmmError> {
        let provider = self.resolve_provider(id).await?;
        self.client_for(&provider).status(order).await.into_result()
    }

    /// Run a one-shot connection probe against a stored provider.
    pub async fn test_provider(&self, id: &ProviderId) -> Result<DiagnosticResult, SmmError> {
        let provider = self.resolve_provider(id).await?;
        let mut tester = ConnectionTester::new(
            provider.base_url.as_str(),
            provider.key,
            Arc::clone(&self.http),
        )
        .timeout(self.timeout);
        Ok(tester.run().await)
    }
}
