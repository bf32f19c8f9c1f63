use serde::{Deserialize, Serialize};

use crate::domain::value::{ApiKey, ProviderId, ProviderUrl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    #[default]
    Active,
    Inactive,
}

/// A configured SMM panel, as stored in the `service_providers` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub name: String,
    #[serde(rename = "api_url")]
    pub base_url: ProviderUrl,
    #[serde(rename = "api_key")]
    pub key: ApiKey,
    #[serde(default, rename = "api_secret")]
    pub secret: Option<ApiKey>,
    #[serde(default)]
    pub status: ProviderStatus,
}

impl ProviderConfig {
    pub fn is_active(&self) -> bool {
        self.status == ProviderStatus::Active
    }
}

/// Provider fields supplied by the operator; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProvider {
    pub name: String,
    #[serde(rename = "api_url")]
    pub base_url: ProviderUrl,
    #[serde(rename = "api_key")]
    pub key: ApiKey,
    #[serde(default, rename = "api_secret")]
    pub secret: Option<ApiKey>,
    #[serde(default)]
    pub status: ProviderStatus,
}

impl NewProvider {
    pub fn into_config(self, id: ProviderId) -> ProviderConfig {
        ProviderConfig {
            id,
            name: self.name,
            base_url: self.base_url,
            key: self.key,
            secret: self.secret,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_row_deserializes_into_config() {
        let row = r#"
        {
          "id": "prov-1",
          "name": "Panel One",
          "api_url": "https://panel.example.com/api/v2",
          "api_key": "abcdef0123456789",
          "status": "inactive"
        }
        "#;
        let config: ProviderConfig = serde_json::from_str(row).unwrap();
        assert_eq!(config.id.as_str(), "prov-1");
        assert_eq!(config.status, ProviderStatus::Inactive);
        assert!(config.secret.is_none());
        assert!(!config.is_active());
    }

    #[test]
    fn store_row_with_bad_url_is_rejected() {
        let row = r#"{"id": "p", "name": "n", "api_url": "panel.example.com", "api_key": "k"}"#;
        assert!(serde_json::from_str::<ProviderConfig>(row).is_err());
    }
}
