use axum::{extract::State, response::Response};

use crate::api::Envelope;
use crate::error::GatewayError;
use crate::middleware::{respond, GatewayResult, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::SentryService;
use crate::types::RoleForm;

use super::component;

fn service(state: &AppState) -> SentryService<'_> {
    SentryService::new(&state.backends, &state.config.security.admin_groups)
}

/// POST /security/api/sentry/list_sentry_roles_by_group
pub async fn list_by_group(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let group_name = params.text_opt("groupName").unwrap_or_default();
        let roles = service(&state)
            .list_roles_by_group(&user, component, group_name)
            .await?;
        Ok(Envelope::success().with("roles", roles).into())
    }
    .await;
    respond("list_sentry_roles_by_group", result)
}

/// POST /security/api/sentry/create_role - Create a role with its privileges and groups
pub async fn create(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role: RoleForm = params.json("role")?;
        let created = service(&state).create_role(&user, component, role).await?;
        Ok(Envelope::success()
            .with("role", serde_json::to_value(&created.role)?)
            .with("privileges", serde_json::to_value(&created.privileges)?)
            .into())
    }
    .await;
    respond("create_role", result)
}

/// POST /security/api/sentry/update_role_groups
pub async fn update_groups(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role: RoleForm = params.json("role")?;
        let diff = service(&state).update_role_groups(&user, component, &role).await?;
        tracing::info!(role = %role.name, added = ?diff.added, removed = ?diff.removed, "updated role groups");
        Ok(Envelope::success().into())
    }
    .await;
    respond("update_role_groups", result)
}

/// POST /security/api/sentry/create_sentry_role
pub async fn create_sentry_role(
    State(state): State<AppState>,
    user: RequestUser,
    params: RequestParams,
) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role_name = role_name(&params)?;
        service(&state).create_sentry_role(&user, component, role_name).await?;
        Ok(Envelope::success().into())
    }
    .await;
    respond("create_sentry_role", result)
}

/// POST /security/api/sentry/drop_sentry_role
pub async fn drop_sentry_role(
    State(state): State<AppState>,
    user: RequestUser,
    params: RequestParams,
) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role_name = role_name(&params)?;
        service(&state).drop_sentry_role(&user, component, role_name).await?;
        Ok(Envelope::success().into())
    }
    .await;
    respond("drop_sentry_role", result)
}

fn role_name(params: &RequestParams) -> Result<&str, GatewayError> {
    let name = params.text("roleName")?;
    if name.trim().is_empty() {
        return Err(GatewayError::parameter("Missing parameter: roleName"));
    }
    Ok(name)
}
