use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::Value;

use crate::middleware::{respond, GatewayResult, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::JobService;

use super::{resolve_interface, selector};

/// POST /jobbrowser/api/job/action[/:interface[/:action]] - Run an action on apps.
///
/// The action itself is read from the `operation` field; the trailing path
/// segment is informational.
pub async fn post(
    State(state): State<AppState>,
    user: RequestUser,
    segments: Option<Path<HashMap<String, String>>>,
    params: RequestParams,
) -> Response {
    let interface = segments.and_then(|Path(mut s)| s.remove("interface"));
    respond("action", run(&state, &user, interface, &params).await)
}

async fn run(
    state: &AppState,
    user: &RequestUser,
    interface: Option<String>,
    params: &RequestParams,
) -> GatewayResult {
    let service = JobService::new(&state.backends, &state.config.jobbrowser);
    let operation: Value = params.json("operation")?;
    service.check_action(&operation)?;

    let interface = resolve_interface(interface, params)?;
    let selector = selector(user, interface, params)?;
    let app_ids: Vec<String> = params.json("app_ids")?;

    Ok(service.action(&selector, &app_ids, operation).await?.into())
}
