mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::*;

#[tokio::test]
async fn forwards_with_rewritten_path_and_query() {
    let hits = counter();
    let backend = start_echo_backend(hits.clone()).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("item-service", backend)])).await;

    let res = reqwest::get(format!("http://{}/api/items/42?expand=true", gateway))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-request-id").is_some());

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["path"], "/items/42?expand=true");
    assert_eq!(body["data"]["method"], "GET");
    assert_eq!(body["data"]["forwardedFor"], "127.0.0.1");
    assert!(body["data"]["requestId"].is_string());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forwards_body_and_authorization() {
    let backend = start_echo_backend(counter()).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("user-service", backend)])).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/api/auth/login", gateway))
        .header("authorization", "Bearer opaque")
        .json(&json!({"email": "ana@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["path"], "/auth/login");
    assert_eq!(body["data"]["method"], "POST");
    assert_eq!(body["data"]["authorization"], "Bearer opaque");
    assert_eq!(body["data"]["body"], r#"{"email":"ana@example.com"}"#);
}

#[tokio::test]
async fn relays_backend_status_untouched() {
    let hits = counter();
    let backend = start_status_backend(StatusCode::NOT_FOUND, hits.clone()).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("list-service", backend)])).await;

    let res = reqwest::get(format!("http://{}/api/lists/99", gateway)).await.unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "backend says no");
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;

    let res = reqwest::get(format!("http://{}/api/itemsx", gateway)).await.unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unregistered_service_is_503() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;

    let res = reqwest::get(format!("http://{}/api/items", gateway)).await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("item-service"));
}

#[tokio::test]
async fn unreachable_backend_is_500_then_circuit_opens() {
    let dead = dead_addr().await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("list-service", dead)])).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/lists", gateway);

    for _ in 0..3 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 500);
    }

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 503);

    let circuits: Value = client
        .get(format!("http://{}/registry/circuits", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(circuits["data"]["list-service"]["state"], "open");
}

#[tokio::test]
async fn open_circuit_makes_no_backend_calls() {
    let hits = counter();
    let backend = start_echo_backend(hits.clone()).await;
    let config = test_config(&[("item-service", backend)]);
    let server = service_gateway::HttpServer::new(config.clone());
    for _ in 0..3 {
        server.breakers().record_failure("item-service");
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway = listener.local_addr().unwrap();
    let shutdown = service_gateway::Shutdown::new();
    let (_tx, updates) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(server.run(listener, updates, shutdown.subscribe()));

    for _ in 0..5 {
        let res = reqwest::get(format!("http://{}/api/items", gateway)).await.unwrap();
        assert_eq!(res.status(), 503);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_errors_do_not_open_circuit_by_default() {
    let hits = counter();
    let backend = start_status_backend(StatusCode::INTERNAL_SERVER_ERROR, hits.clone()).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("item-service", backend)])).await;

    for _ in 0..5 {
        let res = reqwest::get(format!("http://{}/api/items", gateway)).await.unwrap();
        assert_eq!(res.status(), 500);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn server_errors_open_circuit_when_configured() {
    let hits = counter();
    let backend = start_status_backend(StatusCode::BAD_GATEWAY, hits.clone()).await;
    let mut config = test_config(&[("item-service", backend)]);
    config.circuit_breaker.trip_on_server_error = true;
    let (gateway, _shutdown) = start_gateway(config).await;

    for _ in 0..3 {
        let res = reqwest::get(format!("http://{}/api/items", gateway)).await.unwrap();
        assert_eq!(res.status(), 502);
    }
    let res = reqwest::get(format!("http://{}/api/items", gateway)).await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn security_headers_are_added() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;

    let res = reqwest::get(format!("http://{}/registry", gateway)).await.unwrap();
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn rate_limit_rejects_bursts() {
    let mut config = test_config(&[]);
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst_size = 2;
    let (gateway, _shutdown) = start_gateway(config).await;
    let client = reqwest::Client::new();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let res = client.get(format!("http://{}/registry", gateway)).send().await.unwrap();
        statuses.push(res.status().as_u16());
    }
    assert_eq!(&statuses[..2], &[200, 200]);
    assert_eq!(statuses[3], 429);
}

#[tokio::test]
async fn large_upstream_bodies_are_relayed_and_keep_the_circuit_closed() {
    const LEN: usize = 3 * 1024 * 1024;
    let backend = start_large_backend(LEN).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[("item-service", backend)])).await;

    for _ in 0..4 {
        let res = reqwest::get(format!("http://{}/api/items/export", gateway))
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.bytes().await.unwrap().len(), LEN);
    }

    let circuits: Value = reqwest::get(format!("http://{}/registry/circuits", gateway))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(circuits["data"]["item-service"]["state"], "closed");
}
