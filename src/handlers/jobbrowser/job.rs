use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::Envelope;
use crate::error::GatewayError;
use crate::middleware::{respond, GatewayResult, Reply, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::{AppLookup, JobService};
use crate::types::JobInterface;

use super::{resolve_interface, selector};

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HiveQueryRef {
    query_id: Value,
}

/// POST /jobbrowser/api/job[/:interface] - Fetch a single app
pub async fn post(
    State(state): State<AppState>,
    user: RequestUser,
    interface: Option<Path<String>>,
    params: RequestParams,
) -> Response {
    respond("job", fetch(&state, &user, interface.map(|Path(i)| i), &params).await)
}

async fn fetch(
    state: &AppState,
    user: &RequestUser,
    interface: Option<String>,
    params: &RequestParams,
) -> GatewayResult {
    let interface = resolve_interface(interface, params)?;
    let selector = selector(user, interface, params)?;

    let app_id = if interface == JobInterface::QueriesHive {
        id_text(params.body_json::<HiveQueryRef>()?.query_id)
    } else {
        id_text(params.json::<Value>("app_id")?)
    };
    if app_id.is_empty() {
        return Err(GatewayError::parameter("Missing parameter: app_id"));
    }

    let offset = match interface {
        JobInterface::Schedules => params.json_or("pagination", Pagination::default())?.offset,
        _ => None,
    };

    let service = JobService::new(&state.backends, &state.config.jobbrowser);
    let reply = match service.app(&selector, &app_id, offset).await? {
        AppLookup::Failed(doc) => Reply::Json(Value::Object(doc)),
        AppLookup::Found(app) if interface == JobInterface::QueriesHive => Reply::Json(app),
        AppLookup::Found(app) => Envelope::success().with("app", app).into(),
    };
    Ok(reply)
}

/// App ids arrive as JSON strings or numbers
fn id_text(id: Value) -> String {
    match id {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
