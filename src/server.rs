use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{any, get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::Backends;
use crate::config::GatewayConfig;
use crate::handlers::{jobbrowser, security};

/// Read-only state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub backends: Arc<Backends>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig, backends: Backends, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            backends: Arc::new(backends),
            http,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let enable_cors = state.config.server.enable_cors;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/jobbrowser/api", jobbrowser_routes())
        .nest("/security/api/sentry", security_routes())
        .with_state(state);

    // Global middleware
    let router = if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

fn jobbrowser_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(jobbrowser::jobs))
        .route("/jobs/:interface", post(jobbrowser::jobs))
        .route("/job", post(jobbrowser::job))
        .route("/job/action", post(jobbrowser::action))
        .route("/job/action/:interface", post(jobbrowser::action))
        .route("/job/action/:interface/:action", post(jobbrowser::action))
        .route("/job/logs", post(jobbrowser::logs))
        .route("/job/profile", post(jobbrowser::profile))
        .route("/job/:interface", post(jobbrowser::job))
        .route("/query-proxy/*path", any(jobbrowser::query_proxy))
        .route("/data-bundle/:id", get(jobbrowser::download_bundle))
}

fn security_routes() -> Router<AppState> {
    Router::new()
        .route("/fetch_authorizables", get(security::fetch_authorizables))
        .route("/list_sentry_roles_by_group", post(security::list_sentry_roles_by_group))
        .route("/list_sentry_privileges_by_role", post(security::list_sentry_privileges_by_role))
        .route("/create_role", post(security::create_role))
        .route("/update_role_groups", post(security::update_role_groups))
        .route("/save_privileges", post(security::save_privileges))
        .route("/grant_privilege", post(security::grant_privilege))
        .route("/create_sentry_role", post(security::create_sentry_role))
        .route("/drop_sentry_role", post(security::drop_sentry_role))
        .route(
            "/list_sentry_privileges_by_authorizable",
            post(security::list_sentry_privileges_by_authorizable),
        )
        .route("/bulk_delete_privileges", post(security::bulk_delete_privileges))
        .route("/bulk_add_privileges", post(security::bulk_add_privileges))
        .route("/rename_sentry_privilege", post(security::rename_sentry_privilege))
        .route(
            "/list_sentry_privileges_for_provider",
            post(security::list_sentry_privileges_for_provider),
        )
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let interfaces: Vec<&str> = state
        .backends
        .job_interfaces()
        .iter()
        .map(|interface| interface.as_str())
        .collect();

    Json(json!({
        "name": "Hue Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Dispatch gateway for the job browser and security admin APIs",
        "environment": state.config.environment,
        "interfaces": interfaces,
        "endpoints": {
            "health": "/health",
            "jobbrowser": "/jobbrowser/api/{jobs,job,job/action,job/logs,job/profile}[/:interface]",
            "query_proxy": "/jobbrowser/api/query-proxy/*path",
            "data_bundle": "/jobbrowser/api/data-bundle/:id",
            "security": "/security/api/sentry/:operation",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "proxy": state.config.query_store.use_proxy,
    }))
}
