use axum::{extract::State, response::Response};

use crate::api::Envelope;
use crate::middleware::{respond, GatewayResult, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::JobService;

use super::{resolve_interface, selector};

/// POST /jobbrowser/api/job/logs - Fetch one log of an app
pub async fn post(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    respond("logs", fetch(&state, &user, &params).await)
}

async fn fetch(state: &AppState, user: &RequestUser, params: &RequestParams) -> GatewayResult {
    let interface = resolve_interface(None, params)?;
    let selector = selector(user, interface, params)?;
    let app_id: String = params.json("app_id")?;
    let app_type: String = params.json("type")?;
    let log_name: String = params.json("name")?;
    let is_embeddable = params
        .query("is_embeddable")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let service = JobService::new(&state.backends, &state.config.jobbrowser);
    let logs = service
        .logs(&selector, &app_id, &app_type, &log_name, is_embeddable)
        .await?;
    Ok(Envelope::success().with("logs", logs).into())
}
