//! Azure Resource Manager response types
//!
//! Only the fields the collector reads are modelled; everything else in the
//! payloads is ignored.

use crate::{CollectorError, Result, SubscriptionRef};
use azure_provider_report_common::{ProviderState, RegistrationState};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// One page of an ARM list response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// Absolute URL of the next page, if any
    #[serde(default)]
    pub next_link: Option<String>,
}

impl<T: DeserializeOwned> Page<T> {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CollectorError::Decode(format!("Invalid ARM list payload: {}", e)))
    }
}

/// Entry of `GET /subscriptions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSubscription {
    pub subscription_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub state: Option<String>,
}

impl From<ArmSubscription> for SubscriptionRef {
    fn from(subscription: ArmSubscription) -> Self {
        let display_name = subscription
            .display_name
            .unwrap_or_else(|| subscription.subscription_id.clone());

        SubscriptionRef {
            subscription_id: subscription.subscription_id,
            display_name,
            state: subscription.state,
        }
    }
}

/// Entry of `GET /subscriptions/{id}/providers`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmProvider {
    pub namespace: String,

    #[serde(default = "unknown_state")]
    pub registration_state: RegistrationState,
}

fn unknown_state() -> RegistrationState {
    RegistrationState::Unknown
}

impl From<ArmProvider> for ProviderState {
    fn from(provider: ArmProvider) -> Self {
        ProviderState::new(provider.namespace, provider.registration_state)
    }
}

/// Entry of `GET /subscriptions/{id}/resources`
#[derive(Debug, Clone, Deserialize)]
pub struct ArmResource {
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// `az account get-access-token` output
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CliToken {
    pub access_token: String,
}

/// OAuth2 client credentials token response
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthToken {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_with_next_link() {
        let page: Page<ArmResource> = Page::from_json(
            r#"{
                "value": [{"id": "/x", "type": "Microsoft.Web/sites", "name": "site"}],
                "nextLink": "https://management.azure.com/next"
            }"#,
        )
        .unwrap();

        assert_eq!(page.value.len(), 1);
        assert_eq!(page.value[0].resource_type, "Microsoft.Web/sites");
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://management.azure.com/next")
        );
    }

    #[test]
    fn test_empty_page() {
        let page: Page<ArmProvider> = Page::from_json("{}").unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_invalid_payload() {
        let result: Result<Page<ArmProvider>> = Page::from_json("not json");
        assert!(matches!(result, Err(CollectorError::Decode(_))));
    }

    #[test]
    fn test_subscription_without_display_name() {
        let subscription: ArmSubscription =
            serde_json::from_str(r#"{"subscriptionId": "1234", "state": "Enabled"}"#).unwrap();
        let subscription: SubscriptionRef = subscription.into();

        assert_eq!(subscription.display_name, "1234");
        assert_eq!(subscription.state.as_deref(), Some("Enabled"));
    }

    #[test]
    fn test_provider_missing_state() {
        let provider: ArmProvider =
            serde_json::from_str(r#"{"namespace": "Microsoft.Web"}"#).unwrap();
        assert_eq!(provider.registration_state, RegistrationState::Unknown);
    }
}
