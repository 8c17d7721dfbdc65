use axum::{extract::State, response::Response};
use serde_json::{Map, Value};

use crate::api::Envelope;
use crate::middleware::{respond, GatewayResult, RequestUser};
use crate::params::RequestParams;
use crate::server::AppState;
use crate::services::SentryService;
use crate::types::{CheckedPath, RoleForm, UiPrivilege};

use super::component;

fn service(state: &AppState) -> SentryService<'_> {
    SentryService::new(&state.backends, &state.config.security.admin_groups)
}

/// POST /security/api/sentry/list_sentry_privileges_by_role
pub async fn list_by_role(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let server = params.text("server")?;
        let role_name = params.text("roleName")?;
        let privileges = service(&state)
            .list_privileges_by_role(&user, component, server, role_name)
            .await?;
        Ok(Envelope::success().with("sentry_privileges", privileges).into())
    }
    .await;
    respond("list_sentry_privileges_by_role", result)
}

/// POST /security/api/sentry/save_privileges - Apply the role editor's privilege changes
pub async fn save(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role: RoleForm = params.json("role")?;
        let granted = service(&state).save_privileges(&user, component, &role).await?;
        Ok(Envelope::success()
            .with("privileges", serde_json::to_value(&granted)?)
            .into())
    }
    .await;
    respond("save_privileges", result)
}

/// POST /security/api/sentry/grant_privilege
pub async fn grant(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let role_name: String = params.json("roleName")?;
        let privilege: UiPrivilege = params.json("privilege")?;
        let granted = service(&state)
            .grant_privilege(&user, component, &role_name, privilege)
            .await?;
        Ok(Envelope::success()
            .with("privileges", serde_json::to_value(&granted)?)
            .into())
    }
    .await;
    respond("grant_privilege", result)
}

/// POST /security/api/sentry/list_sentry_privileges_by_authorizable
pub async fn list_by_authorizable(
    State(state): State<AppState>,
    user: RequestUser,
    params: RequestParams,
) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let group_name = params.text_opt("groupName").unwrap_or_default();
        let hierarchy: Value = params.json("authorizableHierarchy")?;
        let privileges = service(&state)
            .list_privileges_by_authorizable(&user, component, group_name, hierarchy)
            .await?;
        Ok(Envelope::success().with("privileges", privileges).into())
    }
    .await;
    respond("list_sentry_privileges_by_authorizable", result)
}

/// POST /security/api/sentry/bulk_delete_privileges - Drop privileges under the checked paths
pub async fn bulk_delete(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let checked_paths: Vec<CheckedPath> = params.json("checkedPaths")?;
        let hierarchy: Map<String, Value> = params.json("authorizableHierarchy")?;
        service(&state)
            .bulk_delete_privileges(&user, component, &checked_paths, hierarchy)
            .await?;
        Ok(Envelope::success().into())
    }
    .await;
    respond("bulk_delete_privileges", result)
}

/// POST /security/api/sentry/bulk_add_privileges - Copy privileges onto the checked paths
pub async fn bulk_add(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let privileges: Vec<UiPrivilege> = params.json("privileges")?;
        let checked_paths: Vec<CheckedPath> = params.json("checkedPaths")?;
        service(&state)
            .bulk_add_privileges(&user, component, privileges, &checked_paths)
            .await?;
        Ok(Envelope::success().into())
    }
    .await;
    respond("bulk_add_privileges", result)
}

/// POST /security/api/sentry/rename_sentry_privilege
pub async fn rename(State(state): State<AppState>, user: RequestUser, params: RequestParams) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let old_authorizable: Value = params.json("oldAuthorizable")?;
        let new_authorizable: Value = params.json("newAuthorizable")?;
        service(&state)
            .rename_privilege(&user, component, &old_authorizable, &new_authorizable)
            .await?;
        Ok(Envelope::success().into())
    }
    .await;
    respond("rename_sentry_privilege", result)
}

/// POST /security/api/sentry/list_sentry_privileges_for_provider
pub async fn list_for_provider(
    State(state): State<AppState>,
    user: RequestUser,
    params: RequestParams,
) -> Response {
    let result: GatewayResult = async {
        let component = component(&params)?;
        let groups: Value = params.json("groups")?;
        let role_set: Value = params.json("roleSet")?;
        let hierarchy: Value = params.json("authorizableHierarchy")?;
        let privileges = service(&state)
            .list_privileges_for_provider(&user, component, &groups, &role_set, &hierarchy)
            .await?;
        Ok(Envelope::success().with("sentry_privileges", privileges).into())
    }
    .await;
    respond("list_sentry_privileges_for_provider", result)
}
