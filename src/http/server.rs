//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, rate limiting)
//! - Bind server to listener (plain or TLS)
//! - Dispatch unmatched paths to the reverse proxy
//! - Run the health monitor and apply config reloads

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use arc_swap::ArcSwap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::aggregate;
use crate::auth::{require_auth, JwtVerifier, TokenVerifier};
use crate::config::{AggregationConfig, GatewayConfig, ServiceConfig};
use crate::error::GatewayError;
use crate::health::{HealthChecker, HealthMonitor};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::ApiResponse;
use crate::lifecycle::wait_for;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::proxy::{headers, method_carries_body, ForwardRequest, Forwarder};
use crate::registry::{ServiceRegistration, ServiceRegistry};
use crate::resilience::{BreakerPolicy, CircuitBreakerRegistry};
use crate::routing::RouteTable;
use crate::security::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub routes: Arc<ArcSwap<RouteTable>>,
    pub forwarder: Forwarder,
    pub checker: HealthChecker,
    pub verifier: Arc<dyn TokenVerifier>,
    pub aggregation: Arc<AggregationConfig>,
    pub registry_api_key: Option<Arc<str>>,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server verifying bearer tokens with the configured secret.
    pub fn new(config: GatewayConfig) -> Self {
        let verifier = Arc::new(JwtVerifier::from_config(&config.auth));
        Self::with_verifier(config, verifier)
    }

    /// Create a new HTTP server with a custom token verifier.
    pub fn with_verifier(config: GatewayConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let breakers = Arc::new(CircuitBreakerRegistry::new(BreakerPolicy::from(
            &config.circuit_breaker,
        )));
        let routes = Arc::new(ArcSwap::from_pointee(RouteTable::from_config(&config.routes)));

        let forwarder = Forwarder::new(
            registry.clone(),
            breakers.clone(),
            Duration::from_secs(config.timeouts.upstream_secs),
            config.security.max_body_size,
            config.circuit_breaker.trip_on_server_error,
        );

        let state = AppState {
            registry,
            breakers,
            routes,
            forwarder,
            checker: HealthChecker::new(&config.health_check),
            verifier,
            aggregation: Arc::new(config.aggregation.clone()),
            registry_api_key: config.registry.api_key.as_deref().map(Arc::from),
            max_body_size: config.security.max_body_size,
        };

        seed_services(&state.registry, &config.services);

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let aggregates = Router::new()
            .route("/api/dashboard", get(aggregate::dashboard))
            .route("/api/search", get(aggregate::search))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

        let mut router = Router::new()
            .merge(setup_admin_router(state.clone()))
            .merge(aggregates)
            .fallback(proxy_handler)
            .with_state(state);

        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        if config.security.enable_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }

        router
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Validated configs received on `config_updates` are
    /// applied live.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.state.registry.len(),
            routes = self.state.routes.load().len(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(
            self.state.registry.clone(),
            self.state.checker.clone(),
            self.config.health_check.clone(),
        );
        tokio::spawn(monitor.run(shutdown.resubscribe()));

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_config_update(&reload_state, &new_config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match &self.config.listener.tls {
            None => {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        wait_for(shutdown).await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
            Some(tls) => {
                let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    wait_for(shutdown).await;
                    tracing::info!("Shutdown signal received");
                    shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
                });

                tracing::info!(address = %addr, "TLS enabled");
                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Shared application state (registry, breakers, routes).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn registry(&self) -> Arc<ServiceRegistry> {
        self.state.registry.clone()
    }

    pub fn breakers(&self) -> Arc<CircuitBreakerRegistry> {
        self.state.breakers.clone()
    }

    /// The router with all layers, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

fn seed_services(registry: &ServiceRegistry, services: &[ServiceConfig]) {
    for service in services {
        let registration = ServiceRegistration {
            name: service.name.clone(),
            base_url: service.base_url.clone(),
            version: service.version.clone(),
            endpoints: service.endpoints.clone(),
        };
        if let Err(e) = registry.register(registration) {
            tracing::warn!(service = %service.name, error = %e, "Skipping configured service");
        }
    }
}

/// Apply a reloaded configuration: swap the route table and re-register
/// configured services. Other sections take effect on restart.
pub fn apply_config_update(state: &AppState, config: &GatewayConfig) {
    state.routes.store(Arc::new(RouteTable::from_config(&config.routes)));
    seed_services(&state.registry, &config.services);
    tracing::info!(
        routes = config.routes.len(),
        services = config.services.len(),
        "Configuration reloaded"
    );
}

/// Reverse proxy handler for every path not served by the gateway itself.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let method = request.method().clone();
    let method_str = method.to_string();

    let target = match state.routes.load().resolve(&path, query.as_deref()) {
        Some(target) => target,
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(&method_str, 404, "none", start_time);
            return GatewayError::RouteNotFound(path).into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        service = %target.service,
        upstream_path = %target.rewritten_path,
        "Proxying request"
    );

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let (parts, body) = request.into_parts();

    let body = if method_carries_body(&method) {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
                metrics::record_request(&method_str, 413, &target.service, start_time);
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ApiResponse::error("Request body too large or unreadable"),
                )
                    .into_response();
            }
        }
    } else {
        Bytes::new()
    };

    let forward = ForwardRequest {
        service: target.service.clone(),
        method,
        path: target.rewritten_path,
        headers: headers::upstream_request_headers(&parts.headers, client_ip, Some(&request_id)),
        body,
    };

    match state.forwarder.forward(forward).await {
        Ok(upstream) => {
            metrics::record_request(&method_str, upstream.status.as_u16(), &target.service, start_time);
            let mut response = Response::new(upstream.body);
            *response.status_mut() = upstream.status;
            *response.headers_mut() = headers::relayed_response_headers(&upstream.headers);
            response
        }
        Err(e) => {
            let error = GatewayError::from(e);
            metrics::record_request(&method_str, error.status().as_u16(), &target.service, start_time);
            error.into_response()
        }
    }
}
