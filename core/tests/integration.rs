//! Full provisioning flow against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through the default `ureq` transport. Validates
//! that request building and response parsing agree with an actual server.

use std::sync::Arc;
use std::time::Duration;

use mock_server::{Credentials, Store};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use zabbix_core::{ApiError, UreqTransport, ZabbixClient};

/// Serve a fresh mock server and return its base URL and store.
async fn start_server() -> (String, Arc<RwLock<Store>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let db = Arc::new(RwLock::new(Store::new(Credentials::default())));
    let served = db.clone();
    tokio::spawn(async move { mock_server::run_with_store(listener, served).await });
    (format!("http://{addr}"), db)
}

#[tokio::test]
async fn provisioning_lifecycle() {
    let (url, db) = start_server().await;
    let client = ZabbixClient::for_server(&url).unwrap();

    // Step 1: authenticate.
    let session = client.authenticate("Admin", "zabbix").unwrap().await.unwrap();
    assert_eq!(session.auth_token().len(), 32);

    // Step 2: host group.
    let group_id = session
        .create_host_group("Web servers")
        .unwrap()
        .await
        .unwrap();
    assert_eq!(group_id, "1");

    // Step 3: host in that group.
    let host = json!({
        "host": "web-01",
        "interfaces": [{"type": 1, "main": 1, "useip": 1, "ip": "10.0.0.1", "dns": "", "port": "10050"}],
        "groups": [{"groupid": group_id}]
    });
    let host_id = session.create_host(&host).unwrap().await.unwrap();
    assert_eq!(host_id, "1");

    // Step 4: two web scenarios on the host; both ids come back.
    let checks = json!([
        {
            "name": "Main Page",
            "hostid": host_id,
            "steps": [{"name": "Main Page", "url": "https://xyz.com/main", "status_codes": 200, "no": 1}]
        },
        {
            "name": "Login Page",
            "hostid": host_id,
            "steps": [{"name": "Login", "url": "https://xyz.com/login", "status_codes": 200, "no": 1}]
        }
    ]);
    let ids = session.create_web_scenarios(&checks).unwrap().await.unwrap();
    assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);

    // Step 5: the server saw exactly what was sent.
    let store = db.read().await;
    assert_eq!(store.groups()[0].name, "Web servers");
    assert_eq!(store.hosts()[0].params, host);
    assert_eq!(store.web_scenarios()[1].name, "Login Page");
}

#[tokio::test]
async fn explicit_token_matches_session() {
    let (url, _db) = start_server().await;
    let client = ZabbixClient::for_server(&url).unwrap();

    let token = client.get_auth_token("Admin", "zabbix").unwrap().await.unwrap();
    let group_id = client
        .create_host_group(&token, "Databases")
        .unwrap()
        .await
        .unwrap();
    assert_eq!(group_id, "1");
}

#[tokio::test]
async fn wrong_password_is_a_remote_error() {
    let (url, _db) = start_server().await;
    let client = ZabbixClient::for_server(&url).unwrap();

    let err = client
        .authenticate("Admin", "wrong")
        .unwrap()
        .await
        .unwrap_err();
    match err {
        ApiError::Remote(value) => assert_eq!(value["code"], -32602),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_token_is_a_remote_error() {
    let (url, _db) = start_server().await;
    let client = ZabbixClient::for_server(&url).unwrap();

    let err = client
        .create_host_group("0123456789abcdef0123456789abcdef", "g")
        .unwrap()
        .await
        .unwrap_err();
    match err {
        ApiError::Remote(value) => {
            assert_eq!(value["data"], "Session terminated, re-login, please.")
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_group_is_a_remote_error() {
    let (url, _db) = start_server().await;
    let client = ZabbixClient::for_server(&url).unwrap();
    let session = client.authenticate("Admin", "zabbix").unwrap().await.unwrap();

    session.create_host_group("dup").unwrap().await.unwrap();
    let err = session
        .create_host_group("dup")
        .unwrap()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn wrong_path_is_an_http_status_error() {
    let (url, _db) = start_server().await;
    // The mock only serves /api_jsonrpc.php, so an extra path segment 404s.
    let client = ZabbixClient::for_server(&format!("{url}/zabbix")).unwrap();

    let err = client
        .get_auth_token("Admin", "zabbix")
        .unwrap()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ZabbixClient::for_server(&format!("http://{addr}")).unwrap();
    let err = client
        .get_auth_token("Admin", "zabbix")
        .unwrap()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn caller_configured_agent_is_used() {
    let (url, _db) = start_server().await;
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(5)))
        .build()
        .new_agent();
    let client = ZabbixClient::with_transport(&url, UreqTransport::with_agent(agent)).unwrap();

    let token = client.get_auth_token("Admin", "zabbix").unwrap().await.unwrap();
    assert_eq!(token.len(), 32);
}
