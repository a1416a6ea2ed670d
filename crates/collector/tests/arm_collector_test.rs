//! ARM collector against a local stand-in for management.azure.com

use azure_provider_report_collector::{
    collect_tenant, AccessToken, ArmCollector, Collector, CollectorError, SubscriptionFilter,
};
use azure_provider_report_common::RegistrationState;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn fixture(name: &str, base: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(path).unwrap().replace("{{BASE}}", base)
}

/// Serve canned ARM responses until the test goes quiet
fn start_arm_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let base = format!("http://{}", addr);
    let base_for_thread = base.clone();

    thread::spawn(move || {
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
            let authorized = request.headers().iter().any(|h| {
                h.field.equiv("Authorization") && h.value.as_str() == "Bearer test-token"
            });
            if !authorized {
                let _ = request.respond(Response::from_string("{}").with_status_code(401));
                continue;
            }

            let url = request.url().to_string();
            let (status, body) = if url.starts_with("/subscriptions?") {
                if url.contains("skiptoken=subs2") {
                    (
                        200,
                        r#"{"value": [{"subscriptionId": "sub-b", "displayName": "Staging", "state": "Enabled"}]}"#
                            .to_string(),
                    )
                } else {
                    (
                        200,
                        format!(
                            r#"{{"value": [{{"subscriptionId": "sub-a", "displayName": "Production", "state": "Enabled"}}],
                                "nextLink": "{}/subscriptions?api-version=2022-12-01&%24skiptoken=subs2"}}"#,
                            base_for_thread
                        ),
                    )
                }
            } else if url.starts_with("/subscriptions/sub-a/providers") {
                (200, fixture("providers.json", &base_for_thread))
            } else if url.starts_with("/subscriptions/sub-a/resources") {
                if url.contains("skiptoken=page2") {
                    (200, fixture("resources_page2.json", &base_for_thread))
                } else {
                    (200, fixture("resources_page1.json", &base_for_thread))
                }
            } else if url.starts_with("/subscriptions/sub-b/") {
                (
                    403,
                    r#"{"error": {"code": "AuthorizationFailed", "message": "no access"}}"#
                        .to_string(),
                )
            } else {
                (404, "{}".to_string())
            };

            let content_type = Header::from_bytes("Content-Type", "application/json").unwrap();
            let _ = request.respond(
                Response::from_string(body)
                    .with_status_code(status)
                    .with_header(content_type),
            );
        }
    });

    base
}

fn collector(base: &str) -> ArmCollector {
    ArmCollector::new(AccessToken::new("test-token"))
        .unwrap()
        .with_endpoint(base)
}

#[test]
fn test_list_subscriptions_follows_next_link() {
    let base = start_arm_server();

    let subscriptions = collector(&base).list_subscriptions().unwrap();

    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0].subscription_id, "sub-a");
    assert_eq!(subscriptions[0].display_name, "Production");
    assert_eq!(subscriptions[1].subscription_id, "sub-b");
    assert_eq!(subscriptions[1].state.as_deref(), Some("Enabled"));
}

#[test]
fn test_collect_subscription_feed() {
    let base = start_arm_server();
    let collector = collector(&base);

    let subscriptions = collector.list_subscriptions().unwrap();
    let feed = collector.collect(&subscriptions[0]).unwrap();

    assert_eq!(feed.subscription_id, "sub-a");
    assert_eq!(feed.subscription_name, "Production");
    assert_eq!(feed.providers.len(), 5);
    assert_eq!(feed.providers[3].registration_state, RegistrationState::NotRegistered);
    assert_eq!(feed.providers[4].registration_state, RegistrationState::Unknown);

    // Two resource pages
    assert_eq!(feed.resource_counts["Microsoft.KeyVault"], 2);
    assert_eq!(feed.resource_counts["Microsoft.Network"], 1);
    assert_eq!(feed.resource_counts["microsoft.insights"], 1);
    assert_eq!(feed.total_resources(), 4);
}

#[test]
fn test_http_error_surfaces_status() {
    let base = start_arm_server();
    let collector = collector(&base);

    let subscriptions = collector.list_subscriptions().unwrap();
    let result = collector.collect(&subscriptions[1]);

    match result {
        Err(CollectorError::Http { status, body, .. }) => {
            assert_eq!(status, 403);
            assert!(body.contains("AuthorizationFailed"));
        }
        other => panic!("expected HTTP error, got {:?}", other.map(|f| f.subscription_id)),
    }
}

#[test]
fn test_bad_token_is_rejected() {
    let base = start_arm_server();
    let collector = ArmCollector::new(AccessToken::new("wrong"))
        .unwrap()
        .with_endpoint(&base);

    assert!(matches!(
        collector.list_subscriptions(),
        Err(CollectorError::Http { status: 401, .. })
    ));
}

#[test]
fn test_collect_tenant_partial_result() {
    let base = start_arm_server();

    let collection =
        collect_tenant(&collector(&base), &SubscriptionFilter::default(), |_| {}).unwrap();

    assert_eq!(collection.feeds.len(), 1);
    assert_eq!(collection.feeds[0].subscription_id, "sub-a");
    assert_eq!(collection.failures.len(), 1);
    assert_eq!(collection.failures[0].subscription_name, "Staging");
}
