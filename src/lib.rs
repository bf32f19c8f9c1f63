//! Typed Rust client and connectivity diagnostics for SMM reseller panel APIs.
//!
//! Most panels speak the same loose protocol: a form-encoded POST carrying a
//! `key` and an `action`, answered with provider-shaped JSON. The crate is
//! layered the usual way: a domain layer of strong types, a transport layer
//! for the wire format, a client per provider, a manager aggregating many
//! providers, and diagnostics for the failure paths.
//!
//! ```rust,no_run
//! use smmpanel::{ApiKey, ProviderUrl, SmmClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), smmpanel::SmmError> {
//!     let client = SmmClient::new(
//!         ProviderUrl::parse("https://panel.example.com/api/v2")?,
//!         ApiKey::new("...")?,
//!     )?;
//!     let balance = client.balance().await.into_result()?;
//!     println!("{balance}");
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod diagnostics;
pub mod domain;
pub mod manager;
pub mod settings;
mod transport;

#[cfg(test)]
mod testing;

pub use client::{SmmClient, SmmClientBuilder, SmmError};
pub use diagnostics::{
    ConnectionState, ConnectionTester, NetworkTester, Troubleshooter, suggest_fixes,
};
pub use domain::{
    Action, ApiKey, ApiOutcome, ApiRequest, AppliedFix, DiagnosticResult, KeyField,
    NetworkDetails, NewProvider, OrderId, OrderOptions, OrderParams, ProviderConfig, ProviderId,
    ProviderStatus, ProviderUrl, RefillId, ServiceId, TransportFailure, ValidationError,
    WorkingFormat,
};
pub use manager::{FanOut, ProviderStore, ServiceManager, StoreError};
pub use settings::ServerSettings;
pub use transport::{BoxFuture, HttpCall, HttpResponse, HttpTransport, ReqwestTransport};
