use axum::{
    extract::{Path, State},
    http::Method,
    response::Response,
};

use crate::middleware::{respond, GatewayResult, Reply, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::{ProxyRequest, QueryStoreService};

/// ANY /jobbrowser/api/query-proxy/*path - Relay to the query store
pub async fn query_proxy(
    State(state): State<AppState>,
    user: RequestUser,
    method: Method,
    Path(path): Path<String>,
    params: RequestParams,
) -> Response {
    let request = ProxyRequest {
        method,
        path: &path,
        query: params.query_pairs(),
        body: params.body().clone(),
    };
    respond("query_store_api", proxy(&state, &user, request).await)
}

async fn proxy(state: &AppState, user: &RequestUser, request: ProxyRequest<'_>) -> GatewayResult {
    let service = QueryStoreService::new(&state.http, &state.config.query_store, &state.backends);
    Ok(Reply::Json(service.proxy(&user.name, request).await?))
}

/// GET /jobbrowser/api/data-bundle/:id - Download a query's data bundle
pub async fn download_bundle(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond("query_store_download_bundle", download(&state, id).await)
}

async fn download(state: &AppState, id: String) -> GatewayResult {
    let service = QueryStoreService::new(&state.http, &state.config.query_store, &state.backends);
    let bytes = service.download_bundle(&id).await?;
    Ok(Reply::Attachment {
        filename: format!("{}.zip", id),
        bytes,
    })
}
