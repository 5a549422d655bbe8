//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, Request},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use service_gateway::auth::Claims;
use service_gateway::config::{GatewayConfig, ServiceConfig};
use service_gateway::{HttpServer, Shutdown};

pub const JWT_SECRET: &str = "integration-secret";

/// Serve `router` on an ephemeral localhost port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address with nothing listening on it.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Backend that answers every request with what it received, counting calls.
pub async fn start_echo_backend(hits: Arc<AtomicUsize>) -> SocketAddr {
    let router = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .fallback(move |request: Request| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let (parts, body) = request.into_parts();
                let header = |name: &str| {
                    parts
                        .headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
                Json(json!({
                    "success": true,
                    "data": {
                        "method": parts.method.as_str(),
                        "path": parts.uri.to_string(),
                        "forwardedFor": header("x-forwarded-for"),
                        "requestId": header("x-request-id"),
                        "authorization": header("authorization"),
                        "body": String::from_utf8_lossy(&body),
                    }
                }))
            }
        });
    spawn_router(router).await
}

/// Backend that always answers with `status`, counting calls.
pub async fn start_status_backend(status: StatusCode, hits: Arc<AtomicUsize>) -> SocketAddr {
    let router = Router::new().fallback(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (status, Json(json!({"success": false, "message": "backend says no"})))
        }
    });
    spawn_router(router).await
}

/// Backend answering every path with `len` bytes of `x`.
pub async fn start_large_backend(len: usize) -> SocketAddr {
    let router = Router::new().fallback(move || async move { vec![b'x'; len] });
    spawn_router(router).await
}

pub async fn start_user_service() -> SocketAddr {
    let router = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok", "service": "user-service"})) }))
        .route(
            "/users/profile",
            get(|| async {
                Json(json!({
                    "success": true,
                    "data": {"id": 7, "email": "ana@example.com", "name": "Ana"}
                }))
            }),
        );
    spawn_router(router).await
}

pub async fn start_list_service() -> SocketAddr {
    let router = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok", "service": "list-service"})) }))
        .route(
            "/lists",
            get(|| async {
                Json(json!({
                    "success": true,
                    "data": [
                        {
                            "id": 1,
                            "name": "Compras do mês",
                            "description": "arroz, feijão e café",
                            "items": [{"purchased": true}, {"purchased": false}],
                            "estimatedTotal": 42.5
                        },
                        {
                            "id": 2,
                            "name": "Churrasco",
                            "description": "fim de semana",
                            "items": [{"purchased": false}],
                            "estimatedTotal": 80.0
                        }
                    ]
                }))
            }),
        );
    spawn_router(router).await
}

pub async fn start_item_service() -> SocketAddr {
    let catalog = || {
        vec![
            json!({"id": 1, "name": "Arroz branco 5kg"}),
            json!({"id": 2, "name": "Arroz integral 1kg"}),
            json!({"id": 3, "name": "Feijão preto 1kg"}),
        ]
    };
    let router = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok", "service": "item-service"})) }))
        .route(
            "/items",
            get(move || async move { Json(json!({"success": true, "data": catalog()})) }),
        )
        .route(
            "/items/search",
            get(move |Query(params): Query<std::collections::HashMap<String, String>>| async move {
                let q = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
                let found: Vec<Value> = catalog()
                    .into_iter()
                    .filter(|item| {
                        item["name"]
                            .as_str()
                            .map(|n| n.to_lowercase().contains(&q))
                            .unwrap_or(false)
                    })
                    .collect();
                Json(json!({"success": true, "data": found}))
            }),
        );
    spawn_router(router).await
}

/// Gateway config pointing the given services at local addresses, with
/// background probing and metrics off.
pub fn test_config(services: &[(&str, SocketAddr)]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.health_check.enabled = false;
    config.health_check.timeout_secs = 2;
    config.timeouts.upstream_secs = 5;
    config.observability.metrics_enabled = false;
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.services = services
        .iter()
        .map(|(name, addr)| ServiceConfig {
            name: name.to_string(),
            base_url: format!("http://{}", addr),
            version: "1.0.0".to_string(),
            endpoints: vec!["/health".to_string()],
        })
        .collect();
    config
}

/// Start a gateway on an ephemeral port. Keep the `Shutdown` alive for the
/// duration of the test.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (_tx, config_updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(config);
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, receiver).await;
    });
    (addr, shutdown)
}

/// A valid bearer token for the test secret.
pub fn bearer() -> String {
    let claims = Claims {
        sub: Some("7".to_string()),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iss: None,
        extra: serde_json::Map::new(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap();
    format!("Bearer {}", token)
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}
