use axum::{extract::State, response::Response};

use crate::api::Envelope;
use crate::middleware::{respond, GatewayResult, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::AuthorizableService;

use super::component;

/// GET /security/api/sentry/fetch_authorizables - Browse the authorizable tree
pub async fn fetch(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    respond("fetch_authorizables", browse(&state, &user, &params).await)
}

async fn browse(state: &AppState, user: &RequestUser, params: &RequestParams) -> GatewayResult {
    let component = component(params)?;
    let path = params.text_opt("path").unwrap_or_default();
    let doas = params.text_opt("doas");

    let listing = AuthorizableService::new(&state.backends)
        .fetch(user, component, path, doas)
        .await?;

    let mut envelope = Envelope::success();
    for (key, value) in listing {
        envelope = envelope.with(key, value);
    }
    Ok(envelope.into())
}
