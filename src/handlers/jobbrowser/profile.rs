use axum::{extract::State, response::Response};

use crate::api::Envelope;
use crate::backend::ProfileOutput;
use crate::middleware::{respond, GatewayResult, Reply, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::JobService;

use super::{resolve_interface, selector};

/// POST /jobbrowser/api/job/profile - Fetch a profile property of an app
pub async fn post(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    respond("profile", fetch(&state, &user, &params).await)
}

async fn fetch(state: &AppState, user: &RequestUser, params: &RequestParams) -> GatewayResult {
    let interface = resolve_interface(None, params)?;
    let selector = selector(user, interface, params)?;
    let app_id: String = params.json("app_id")?;
    let app_type: String = params.json("app_type")?;
    let app_property: String = params.json("app_property")?;
    let app_filters = params.filters("app_filters")?;

    let service = JobService::new(&state.backends, &state.config.jobbrowser);
    let reply = match service
        .profile(&selector, &app_id, &app_type, &app_property, &app_filters)
        .await?
    {
        ProfileOutput::Json(value) => Envelope::success().with(app_property, value).into(),
        ProfileOutput::Raw { content_type, body } => Reply::Raw { content_type, body },
    };
    Ok(reply)
}
