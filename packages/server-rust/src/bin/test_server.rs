//! Standalone Atrium server for integration testing and local development.
//!
//! Serves demo project and issue routes over an in-memory identifier store.
//! Callers identify themselves with `x-user-id` (and optionally
//! `x-user-timezone`).
//!
//! ```text
//! test-server --port 8080 --alias acme:ENG=11111111-1111-1111-1111-111111111111
//! curl -H 'x-user-id: u-1' localhost:8080/api/workspaces/acme/projects/ENG/issues/
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use atrium_core::is_canonical;
use atrium_server::network::{NetworkConfig, NetworkModule, ResourceRoutes};
use atrium_server::service::{
    build_request_pipeline, handler_fn, localize, route_names, AliasResolver, ApiError,
    PipelineCollaborators, ResourceRequest, ResourceRouter, ServerConfig,
};
use atrium_server::storage::MemoryIdentifierStore;
use atrium_server::telemetry::{init_tracing, DEFAULT_FILTER};
use atrium_server::traits::{TracingExceptionLogger, TrustedHeaderAuthenticator};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use serde_json::json;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "test-server", about = "Atrium resource dispatch test server")]
struct Args {
    #[arg(long, env = "ATRIUM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// 0 picks a free port.
    #[arg(long, env = "ATRIUM_PORT", default_value_t = 0)]
    port: u16,

    /// Project alias, as `tenant:KEY=uuid`. Repeatable.
    #[arg(long = "alias", value_parser = parse_alias)]
    aliases: Vec<Alias>,

    /// Zone for anonymous callers and callers without a preference.
    #[arg(long, env = "ATRIUM_DEFAULT_TIME_ZONE", default_value = "UTC", value_parser = parse_zone)]
    default_time_zone: Tz,

    /// Let anonymous callers reach resource handlers.
    #[arg(long)]
    allow_anonymous: bool,

    /// Per-request diagnostics and full error detail in logs.
    #[arg(long, env = "ATRIUM_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "ATRIUM_LOG_JSON")]
    log_json: bool,

    /// Address for the Prometheus scrape endpoint. Disabled when absent.
    #[arg(long, env = "ATRIUM_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
struct Alias {
    tenant: String,
    key: String,
    id: String,
}

fn parse_alias(raw: &str) -> Result<Alias, String> {
    let (scope, id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected tenant:KEY=uuid, got `{raw}`"))?;
    let (tenant, key) = scope
        .split_once(':')
        .ok_or_else(|| format!("expected tenant:KEY=uuid, got `{raw}`"))?;
    if tenant.is_empty() || key.is_empty() {
        return Err(format!("tenant and key must be non-empty in `{raw}`"));
    }
    if !is_canonical(id) {
        return Err(format!("`{id}` is not a UUID"));
    }
    Ok(Alias {
        tenant: tenant.to_string(),
        key: key.to_string(),
        id: id.to_string(),
    })
}

fn parse_zone(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>().map_err(|e| e.to_string())
}

/// Echoes what the pipeline resolved for this request.
fn context_json(request: &ResourceRequest) -> serde_json::Value {
    let ctx = request.ctx();
    json!({
        "route": request.route_name(),
        "workspace": ctx.workspace_slug(),
        "ids": ctx.resource_ids(),
        "fields": ctx.fields(),
        "expand": ctx.expand(),
        "filters": ctx.filter_params(),
        "user": ctx.principal().map(|p| p.id.clone()),
        "time_zone": ctx.time_zone(),
        "now": localize(Utc::now()).to_rfc3339(),
    })
}

async fn show(request: ResourceRequest) -> Result<Response, ApiError> {
    Ok(Json(context_json(&request)).into_response())
}

async fn issues(request: ResourceRequest) -> Result<Response, ApiError> {
    if request.method() != axum::http::Method::POST {
        return show(request).await;
    }
    let payload = request.json_payload()?;
    let name = payload.require_str("name")?;
    if name.trim().is_empty() {
        return Err(ApiError::ValidationFailure("issue name is blank".to_string()));
    }
    let mut body = context_json(&request);
    body["created"] = json!({ "name": name });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

fn demo_router() -> ResourceRouter {
    ResourceRouter::new()
        .with(route_names::PROJECT, handler_fn(show))
        .with("issues", handler_fn(issues))
        .with("issue", handler_fn(show))
}

fn demo_routes() -> ResourceRoutes {
    ResourceRoutes::new()
        .route("/api/workspaces/{slug}/projects/{pk}/", route_names::PROJECT)
        .route(
            "/api/workspaces/{slug}/projects/{project_id}/issues/",
            "issues",
        )
        .route(
            "/api/workspaces/{slug}/projects/{project_id}/issues/{issue_id}/",
            "issue",
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json, DEFAULT_FILTER)?;

    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    let store = MemoryIdentifierStore::new();
    for alias in &args.aliases {
        store.insert(&alias.tenant, &alias.key, &alias.id);
    }
    info!(aliases = store.len(), "identifier store seeded");

    let collaborators = PipelineCollaborators {
        resolver: Arc::new(AliasResolver::new(Arc::new(store))),
        authenticator: Arc::new(TrustedHeaderAuthenticator),
        logger: Arc::new(TracingExceptionLogger),
    };
    let config = ServerConfig {
        debug: args.debug,
        require_authentication: !args.allow_anonymous,
        default_time_zone: args.default_time_zone,
    };

    let mut module = NetworkModule::new(NetworkConfig {
        host: args.host,
        port: args.port,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        ..NetworkConfig::default()
    });
    module.mount(
        demo_routes(),
        build_request_pipeline(demo_router(), &collaborators, &config),
    );

    let port = module.start().await?;
    // Machine-readable line for test harnesses.
    println!("PORT={port}");

    module
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown signal received");
        })
        .await
}
