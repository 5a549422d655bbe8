mod common;

use serde_json::{json, Value};

use common::*;

#[tokio::test]
async fn health_reports_each_service() {
    let users = start_user_service().await;
    let items = start_item_service().await;
    let dead = dead_addr().await;
    let (gateway, _shutdown) = start_gateway(test_config(&[
        ("user-service", users),
        ("item-service", items),
        ("list-service", dead),
    ]))
    .await;

    let res = reqwest::get(format!("http://{}/health", gateway)).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user-service"]["status"], "healthy");
    assert_eq!(body["data"]["item-service"]["service"], "item-service");
    assert_eq!(body["data"]["list-service"]["status"], "unhealthy");
    assert!(body["data"]["list-service"]["error"].is_string());

    let registry: Value = reqwest::get(format!("http://{}/registry", gateway))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registry["data"]["list-service"]["healthy"], false);
    assert_eq!(registry["data"]["user-service"]["healthy"], true);
}

#[tokio::test]
async fn register_heartbeat_and_deregister() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{}/registry/register", gateway))
        .json(&json!({
            "name": "item-service",
            "baseUrl": "http://127.0.0.1:3002/",
            "endpoints": ["/items", "/health"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["baseUrl"], "http://127.0.0.1:3002");
    assert_eq!(body["data"]["version"], "1.0.0");
    assert_eq!(body["data"]["healthy"], true);

    let res = client
        .post(format!("http://{}/registry/heartbeat", gateway))
        .json(&json!({"name": "item-service", "healthy": false}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], true);

    let registry: Value = client
        .get(format!("http://{}/registry", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registry["data"]["item-service"]["healthy"], false);

    let res = client
        .delete(format!("http://{}/registry/item-service", gateway))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], true);

    let registry: Value = client
        .get(format!("http://{}/registry", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(registry["data"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn heartbeat_for_unknown_service_is_ignored() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/registry/heartbeat", gateway))
        .json(&json!({"name": "late-service", "healthy": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], false);
}

#[tokio::test]
async fn invalid_registration_is_400() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/registry/register", gateway))
        .json(&json!({"name": "svc", "baseUrl": "not a url"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_bodies_are_400_with_envelope() {
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{}/registry/register", gateway))
        .json(&json!({"name": "svc"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("baseUrl"));

    let res = client
        .post(format!("http://{}/registry/heartbeat", gateway))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let registry: Value = client
        .get(format!("http://{}/registry", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(registry["data"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn api_key_guards_mutations_only() {
    let mut config = test_config(&[]);
    config.registry.api_key = Some("s3cret".to_string());
    let (gateway, _shutdown) = start_gateway(config).await;
    let client = reqwest::Client::new();
    let registration = json!({"name": "list-service", "baseUrl": "http://127.0.0.1:3003"});

    let res = client
        .post(format!("http://{}/registry/register", gateway))
        .json(&registration)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .post(format!("http://{}/registry/register", gateway))
        .header("x-api-key", "s3cret")
        .json(&registration)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(format!("http://{}/registry", gateway)).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn registered_service_receives_proxied_traffic() {
    let backend = start_echo_backend(counter()).await;
    let (gateway, _shutdown) = start_gateway(test_config(&[])).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{}/api/lists", gateway)).send().await.unwrap();
    assert_eq!(res.status(), 503);

    client
        .post(format!("http://{}/registry/register", gateway))
        .json(&json!({"name": "list-service", "baseUrl": format!("http://{}", backend)}))
        .send()
        .await
        .unwrap();

    let res = client.get(format!("http://{}/api/lists", gateway)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["path"], "/lists");
}
