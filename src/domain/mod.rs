//! Domain layer: strong types with validation and invariants (no I/O).

mod provider;
mod request;
mod response;
mod validation;
mod value;

pub use provider::{NewProvider, ProviderConfig, ProviderStatus};
pub use request::{Action, ApiRequest, Encoding, KeyField, Method, OrderOptions, OrderParams};
pub use response::{
    ApiOutcome, AppliedFix, DiagnosticResult, NetworkDetails, TransportFailure, WorkingFormat,
};
pub use validation::ValidationError;
pub use value::{ApiKey, OrderId, ProviderId, ProviderUrl, RefillId, ServiceId};

pub(crate) use value::{join_ids, redact};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_rejects_empty() {
        assert!(matches!(
            ApiKey::new("   "),
            Err(ValidationError::Empty {
                field: ApiKey::FIELD
            })
        ));
    }

    #[test]
    fn provider_url_requires_scheme() {
        assert!(matches!(
            ProviderUrl::parse("api.example.com"),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert!(ProviderUrl::parse("http://api.example.com").is_ok());
    }

    #[test]
    fn joined_ids_keep_order_and_duplicates() {
        let ids = [OrderId::from(5), OrderId::from(3), OrderId::from(5)];
        assert_eq!(join_ids(&ids), "5,3,5");
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(Action::Add.as_str(), "add");
        assert_eq!(Action::RefillStatus.as_str(), "refill_status");
        assert_eq!(KeyField::ApiToken.as_str(), "api_token");
    }
}
