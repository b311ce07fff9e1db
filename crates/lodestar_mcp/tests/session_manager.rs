//! Integration tests for the keyed session cache.

mod common;

use common::MockConnector;
use core::time::Duration;
use lodestar_mcp::{ConnectionParams, ProvisionError, SessionKey, SessionManager, Transport};
use std::collections::BTreeMap;
use std::sync::Arc;

fn params(url: &str, token: &str) -> ConnectionParams {
    let mut headers = BTreeMap::new();
    headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    ConnectionParams::new(Transport::StreamableHttp, url, headers)
}

fn declared(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn same_key_returns_the_cached_session() {
    let connector = Arc::new(MockConnector::offering(&["search"]));
    let manager = SessionManager::new(connector.clone());
    let p = params("https://a.example.com/mcp", "t");

    let first = manager.get_session("a", &p, &declared(&["search"])).await.unwrap();
    let second = manager.get_session("a", &p, &declared(&["search"])).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.list_calls(), 1);
    assert!(manager.contains(&SessionKey::new("a", p)));
}

#[tokio::test]
async fn any_parameter_difference_is_a_new_session() {
    let connector = Arc::new(MockConnector::offering(&["search"]));
    let manager = SessionManager::new(connector.clone());
    let tools = declared(&["search"]);

    manager
        .get_session("a", &params("https://a.example.com/mcp", "one"), &tools)
        .await
        .unwrap();
    manager
        .get_session("a", &params("https://a.example.com/mcp", "two"), &tools)
        .await
        .unwrap();
    manager
        .get_session("b", &params("https://a.example.com/mcp", "one"), &tools)
        .await
        .unwrap();

    assert_eq!(manager.len(), 3);
    assert_eq!(connector.connects(), 3);
}

#[tokio::test]
async fn tools_follow_declaration_order() {
    let manager = SessionManager::new(Arc::new(MockConnector::offering(&[
        "alpha", "beta", "gamma",
    ])));
    let session = manager
        .get_session(
            "a",
            &params("https://a.example.com/mcp", "t"),
            &declared(&["gamma", "alpha"]),
        )
        .await
        .unwrap();

    let names: Vec<_> = session.tools().iter().map(|t| t.name()).collect();
    assert_eq!(names, ["gamma", "alpha"]);
    assert!(session.tools().iter().all(|t| t.provider() == "a"));
    assert_eq!(session.provider(), "a");
}

#[tokio::test]
async fn missing_tool_leaves_nothing_cached() {
    let connector = Arc::new(MockConnector::offering(&["search"]));
    let manager = SessionManager::new(connector.clone());
    let p = params("https://a.example.com/mcp", "t");

    let err = manager
        .get_session("a", &p, &declared(&["search", "list_orgs"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::ToolNotFound { ref tool, .. } if tool == "list_orgs"));
    assert!(manager.is_empty());

    // The failed slot does not block a later attempt.
    manager
        .get_session("a", &p, &declared(&["search"]))
        .await
        .unwrap();
    assert_eq!(connector.connects(), 2);
}

#[tokio::test]
async fn release_forgets_the_session() {
    let connector = Arc::new(MockConnector::offering(&["search"]));
    let manager = SessionManager::new(connector.clone());
    let p = params("https://a.example.com/mcp", "t");
    let key = SessionKey::new("a", p.clone());

    let held = manager.get_session("a", &p, &declared(&["search"])).await.unwrap();
    assert!(manager.release(&key));
    assert!(!manager.release(&key));
    assert!(manager.cached(&key).is_none());

    // Outstanding handles stay usable after release.
    assert_eq!(held.tools().len(), 1);

    manager.get_session("a", &p, &declared(&["search"])).await.unwrap();
    assert_eq!(connector.connects(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_shares_one_connection() {
    let connector = Arc::new(
        MockConnector::offering(&["search"]).with_delay(Duration::from_millis(50)),
    );
    let manager = Arc::new(SessionManager::new(connector.clone()));
    let p = params("https://a.example.com/mcp", "t");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let p = p.clone();
            tokio::spawn(async move {
                manager
                    .get_session("a", &p, &["search".to_string()])
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap());
    }

    assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.list_calls(), 1);
}

#[test]
fn debug_output_hides_header_values() {
    let printed = format!("{:?}", params("https://a.example.com/mcp", "s3cret"));
    assert!(printed.contains("Authorization"));
    assert!(!printed.contains("s3cret"));
}
