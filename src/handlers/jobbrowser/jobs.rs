use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::{Map, Value};

use crate::api::Envelope;
use crate::middleware::{respond, GatewayResult, Reply, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::JobService;
use crate::types::JobInterface;

use super::{resolve_interface, selector};

/// POST /jobbrowser/api/jobs[/:interface] - List apps matching the filters
pub async fn post(
    State(state): State<AppState>,
    user: RequestUser,
    interface: Option<Path<String>>,
    params: RequestParams,
) -> Response {
    respond("jobs", list(&state, &user, interface.map(|Path(i)| i), &params).await)
}

async fn list(
    state: &AppState,
    user: &RequestUser,
    interface: Option<String>,
    params: &RequestParams,
) -> GatewayResult {
    let interface = resolve_interface(interface, params)?;
    let selector = selector(user, interface, params)?;

    // Hive queries post their filters as the raw body
    let filters = if interface == JobInterface::QueriesHive {
        params.body_json::<Map<String, Value>>()?
    } else {
        params.filters("filters")?
    };

    let service = JobService::new(&state.backends, &state.config.jobbrowser);
    let listing = service.apps(&selector, &filters).await?;

    if interface == JobInterface::QueriesHive {
        return Ok(Reply::Json(Value::Array(listing.apps)));
    }

    Ok(Envelope::success()
        .with("apps", listing.apps)
        .with("total", listing.total.unwrap_or(Value::Null))
        .into())
}
