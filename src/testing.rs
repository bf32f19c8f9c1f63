//! Scripted transport and store fakes shared by unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{NewProvider, ProviderConfig, ProviderId, TransportFailure};
use crate::manager::{ProviderStore, StoreError};
use crate::transport::{BoxFuture, HttpCall, HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
pub enum Reply {
    Http(u16, String),
    Fail(TransportFailure),
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self::Http(200, body.to_owned())
    }
}

#[derive(Debug, Clone)]
struct Rule {
    url: String,
    param: Option<(String, String)>,
    reply: Reply,
}

#[derive(Debug)]
struct FakeTransportState {
    calls: Vec<HttpCall>,
    rules: Vec<Rule>,
    fallback: Reply,
}

/// Answers by exact URL (and optionally one param), first matching rule wins.
#[derive(Debug, Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new(fallback: Reply) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeTransportState {
                calls: Vec::new(),
                rules: Vec::new(),
                fallback,
            })),
        }
    }

    pub fn replying(body: &str) -> Self {
        Self::new(Reply::json(body))
    }

    pub fn failing(failure: TransportFailure) -> Self {
        Self::new(Reply::Fail(failure))
    }

    pub fn on_url(self, url: &str, reply: Reply) -> Self {
        self.state.lock().unwrap().rules.push(Rule {
            url: url.to_owned(),
            param: None,
            reply,
        });
        self
    }

    pub fn on(self, url: &str, name: &str, value: &str, reply: Reply) -> Self {
        self.state.lock().unwrap().rules.push(Rule {
            url: url.to_owned(),
            param: Some((name.to_owned(), value.to_owned())),
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> HttpCall {
        self.calls().pop().expect("no call recorded")
    }

    pub fn arc(&self) -> Arc<dyn HttpTransport> {
        Arc::new(self.clone())
    }
}

impl HttpTransport for FakeTransport {
    fn execute<'a>(
        &'a self,
        call: &'a HttpCall,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
        Box::pin(async move {
            let reply = {
                let mut state = self.state.lock().unwrap();
                state.calls.push(call.clone());
                state
                    .rules
                    .iter()
                    .find(|rule| {
                        rule.url == call.url
                            && rule.param.as_ref().is_none_or(|(name, value)| {
                                call.params.iter().any(|(n, v)| n == name && v == value)
                            })
                    })
                    .map_or_else(|| state.fallback.clone(), |rule| rule.reply.clone())
            };
            match reply {
                Reply::Http(status, body) => Ok(HttpResponse { status, body }),
                Reply::Fail(failure) => Err(failure),
            }
        })
    }
}

pub fn param<'a>(call: &'a HttpCall, name: &str) -> Option<&'a str> {
    call.params
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    rows: BTreeMap<ProviderId, ProviderConfig>,
    next_id: u32,
    list_calls: usize,
    get_calls: usize,
    fail_inserts: bool,
}

/// In-memory `service_providers` collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    pub fn with(rows: Vec<ProviderConfig>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for row in rows {
                state.rows.insert(row.id.clone(), row);
            }
        }
        store
    }

    pub fn fail_inserts(&self) {
        self.state.lock().unwrap().fail_inserts = true;
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn row(&self, id: &ProviderId) -> Option<ProviderConfig> {
        self.state.lock().unwrap().rows.get(id).cloned()
    }
}

#[async_trait]
impl ProviderStore for MemoryStore {
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.rows.values().cloned().collect())
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<Option<ProviderConfig>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        Ok(state.rows.get(id).cloned())
    }

    async fn insert_provider(&self, provider: NewProvider) -> Result<ProviderConfig, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_inserts {
            return Err(StoreError::new("insert rejected"));
        }
        state.next_id += 1;
        let id = ProviderId::new(format!("new-{}", state.next_id)).unwrap();
        let config = provider.into_config(id.clone());
        state.rows.insert(id, config.clone());
        Ok(config)
    }

    async fn update_provider(
        &self,
        provider: &ProviderConfig,
    ) -> Result<ProviderConfig, StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.rows.contains_key(&provider.id) {
            return Err(StoreError::new("row not found"));
        }
        state.rows.insert(provider.id.clone(), provider.clone());
        Ok(provider.clone())
    }

    async fn delete_provider(&self, id: &ProviderId) -> Result<(), StoreError> {
        self.state.lock().unwrap().rows.remove(id);
        Ok(())
    }
}
