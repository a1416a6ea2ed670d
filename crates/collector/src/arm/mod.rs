//! Live collector backed by the Azure Resource Manager REST API

pub mod types;

use self::types::{ArmProvider, ArmResource, ArmSubscription, Page};
use crate::auth::AccessToken;
use crate::{resource_counts, Collector, CollectorError, Result, SubscriptionRef};
use azure_provider_report_common::SubscriptionFeed;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Public Azure cloud ARM endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
const PROVIDERS_API_VERSION: &str = "2021-04-01";
const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Upper bound on followed `nextLink`s for a single listing
const MAX_PAGES: usize = 1_000;

/// ARM collector
///
/// Issues sequential, blocking requests. All list calls follow `nextLink`
/// pagination until exhausted.
pub struct ArmCollector {
    client: Client,
    endpoint: String,
    token: AccessToken,
}

impl ArmCollector {
    /// Create a collector for the public cloud endpoint
    pub fn new(token: AccessToken) -> Result<Self> {
        let client = build_http_client()?;
        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token,
        })
    }

    /// Point the collector at another ARM endpoint (sovereign clouds, tests)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn subscription_url(&self, subscription_id: &str, collection: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}?api-version={}",
            self.endpoint, subscription_id, collection, api_version
        )
    }

    /// GET a list endpoint and every following page
    fn get_paged<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(CollectorError::Decode(format!(
                    "Pagination exceeded {} pages at {}",
                    MAX_PAGES, url
                )));
            }

            debug!(%url, "GET");
            let response = self
                .client
                .get(&url)
                .bearer_auth(self.token.secret())
                .send()?;

            let status = response.status();
            let body = response.text()?;
            if !status.is_success() {
                return Err(CollectorError::Http {
                    status: status.as_u16(),
                    url,
                    body: truncate(&body, 512),
                });
            }

            let page: Page<T> = Page::from_json(&body)?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(items)
    }
}

impl Collector for ArmCollector {
    fn list_subscriptions(&self) -> Result<Vec<SubscriptionRef>> {
        let url = format!(
            "{}/subscriptions?api-version={}",
            self.endpoint, SUBSCRIPTIONS_API_VERSION
        );
        let subscriptions: Vec<ArmSubscription> = self.get_paged(url)?;

        info!(count = subscriptions.len(), "Enumerated subscriptions");
        Ok(subscriptions.into_iter().map(SubscriptionRef::from).collect())
    }

    fn collect(&self, subscription: &SubscriptionRef) -> Result<SubscriptionFeed> {
        let id = &subscription.subscription_id;

        let providers: Vec<ArmProvider> =
            self.get_paged(self.subscription_url(id, "providers", PROVIDERS_API_VERSION))?;
        let resources: Vec<ArmResource> =
            self.get_paged(self.subscription_url(id, "resources", RESOURCES_API_VERSION))?;

        debug!(
            subscription = %id,
            providers = providers.len(),
            resources = resources.len(),
            "Collected subscription"
        );

        Ok(SubscriptionFeed {
            subscription_id: id.clone(),
            subscription_name: subscription.display_name.clone(),
            resource_counts: resource_counts(resources.iter().map(|r| r.resource_type.as_str())),
            providers: providers.into_iter().map(Into::into).collect(),
        })
    }
}

pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("azure-provider-report/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(CollectorError::Request)
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        // Never splits a multi-byte character
        assert_eq!(truncate("aé", 2), "a...");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let collector = ArmCollector::new(AccessToken::new("token"))
            .unwrap()
            .with_endpoint("http://localhost:8080/");

        assert_eq!(collector.endpoint(), "http://localhost:8080");
        assert_eq!(
            collector.subscription_url("sub", "providers", PROVIDERS_API_VERSION),
            "http://localhost:8080/subscriptions/sub/providers?api-version=2021-04-01"
        );
    }
}
