//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `mount()` attaches resource routes to a
//! dispatch pipeline, `start()` binds the TCP listener, and `serve()` accepts
//! connections until shutdown.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::Service;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{health_handler, liveness_handler, readiness_handler, AppState, ResourceRoutes};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::ResourceRequest;

/// Owns the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    resources: Router,
    resource_routes: usize,
}

impl NetworkModule {
    /// Creates a network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            resources: Router::new(),
            resource_routes: 0,
        }
    }

    /// Shared shutdown controller, for health checks and triggering shutdown.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Mounts `routes`, dispatching each through `pipeline`.
    ///
    /// May be called more than once; route paths must not overlap.
    pub fn mount<P>(&mut self, routes: ResourceRoutes, pipeline: P)
    where
        P: Service<ResourceRequest, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        P::Future: Send + 'static,
    {
        for name in routes.names() {
            info!(route = name, "mounting resource route");
        }
        self.resource_routes += routes.len();
        let mounted = routes.into_router(
            pipeline,
            Arc::clone(&self.shutdown),
            self.config.max_body_bytes,
        );
        self.resources = std::mem::replace(&mut self.resources, Router::new()).merge(mounted);
    }

    /// Assembles the axum router: health probes, mounted resource routes and
    /// the transport middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    /// - every mounted resource route, any method
    pub fn build_router(&self) -> Router {
        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            resource_routes: self.resource_routes,
            start_time: Instant::now(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .with_state(state)
            .merge(self.resources.clone())
            .layer(build_http_layers(&self.config))
    }

    /// Binds the TCP listener and returns the bound port (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight resource
    /// requests for up to `drain_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, TLS material cannot be
    /// loaded, or the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.take() else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = self.build_router();
        let controller = Arc::clone(&self.shutdown);

        controller.set_ready();

        match &self.config.tls {
            Some(tls) => serve_tls(listener, router, tls, shutdown).await?,
            None => serve_plain(listener, router, shutdown).await?,
        }

        controller.trigger_shutdown();
        if controller.wait_for_drain(self.config.drain_timeout).await {
            info!("all in-flight requests drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "drain timeout expired with requests remaining"
            );
        }
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("serving plain HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves TLS through `axum-server`, reusing the pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving TLS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::response::IntoResponse;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::network::HealthState;
    use crate::service::{
        build_request_pipeline, handler_fn, ApiError, PassThroughResolver, PipelineCollaborators,
        ResourceRouter, ServerConfig,
    };
    use crate::test_support::{body_json, RecordingLogger};
    use crate::traits::TrustedHeaderAuthenticator;

    fn mounted_module() -> NetworkModule {
        let router = ResourceRouter::new().with(
            "ping",
            handler_fn(|_req| async { Ok::<_, ApiError>("pong".into_response()) }),
        );
        let collaborators = PipelineCollaborators {
            resolver: Arc::new(PassThroughResolver),
            authenticator: Arc::new(TrustedHeaderAuthenticator),
            logger: Arc::new(RecordingLogger::default()),
        };
        let config = ServerConfig {
            require_authentication: false,
            ..ServerConfig::default()
        };

        let mut module = NetworkModule::new(NetworkConfig::default());
        module.mount(
            ResourceRoutes::new().route("/api/ping", "ping"),
            build_request_pipeline(router, &collaborators, &config),
        );
        module
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = NetworkModule::new(NetworkConfig::default());
        assert!(module.listener.is_none());
        assert_eq!(module.resource_routes, 0);
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = NetworkModule::new(NetworkConfig::default());
        assert!(Arc::ptr_eq(&module.shutdown_controller(), &module.shutdown_controller()));
    }

    #[tokio::test]
    async fn router_serves_health_and_resources() {
        let module = mounted_module();
        let router = module.build_router();

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(health).await["resource_routes"], 1);

        let ping = router
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ping.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = NetworkModule::new(NetworkConfig {
            host: "127.0.0.1".to_string(),
            ..NetworkConfig::default()
        });
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0);
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let module = NetworkModule::new(NetworkConfig::default());
        let err = module.serve(std::future::pending::<()>()).await.unwrap_err();
        assert!(err.to_string().contains("start()"));
    }

    #[tokio::test]
    async fn serve_stops_and_drains_on_signal() {
        let mut module = mounted_module();
        module.start().await.unwrap();
        let controller = module.shutdown_controller();

        module.serve(async {}).await.unwrap();
        assert_eq!(controller.health_state(), HealthState::Stopped);
    }
}
